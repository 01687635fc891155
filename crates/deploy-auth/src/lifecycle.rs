//! Expiry arithmetic for stored tokens. Nothing in here touches the network or disk.

use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};

/// Margin before expiry inside which tokens are renewed ahead of time.
pub const PROACTIVE_REFRESH_WINDOW_MINUTES: i64 = 15;

/// Lifetime assumed for client tokens whose response carries no expiry.
pub const DEFAULT_CLIENT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    NeedsRefresh,
    Expired,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenState::Valid => "valid",
            TokenState::NeedsRefresh => "needs-refresh",
            TokenState::Expired => "expired",
        }
    }
}

pub fn default_window() -> ChronoDuration {
    ChronoDuration::minutes(PROACTIVE_REFRESH_WINDOW_MINUTES)
}

pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Full-precision UTC form used for every persisted `expires_at`.
pub fn format_expiry(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `None` when `seconds` does not fit a representable instant.
pub fn expires_in(seconds: i64) -> Option<String> {
    expires_in_at(seconds, Utc::now())
}

pub fn expires_in_at(seconds: i64, now: DateTime<Utc>) -> Option<String> {
    let delta = ChronoDuration::try_seconds(seconds)?;
    now.checked_add_signed(delta).map(format_expiry)
}

pub fn is_expired(expires_at: Option<&str>) -> bool {
    is_expired_at(expires_at, Utc::now())
}

pub fn is_expired_at(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    match expires_at.and_then(parse_rfc3339) {
        Some(expires_at) => now >= expires_at,
        None => true,
    }
}

pub fn should_proactively_refresh(expires_at: Option<&str>, window: ChronoDuration) -> bool {
    should_proactively_refresh_at(expires_at, window, Utc::now())
}

pub fn should_proactively_refresh_at(
    expires_at: Option<&str>,
    window: ChronoDuration,
    now: DateTime<Utc>,
) -> bool {
    match expires_at.and_then(parse_rfc3339) {
        Some(expires_at) => now >= expires_at - window,
        None => true,
    }
}

pub fn classify(expires_at: Option<&str>, window: ChronoDuration) -> TokenState {
    classify_at(expires_at, window, Utc::now())
}

pub fn classify_at(
    expires_at: Option<&str>,
    window: ChronoDuration,
    now: DateTime<Utc>,
) -> TokenState {
    if is_expired_at(expires_at, now) {
        TokenState::Expired
    } else if should_proactively_refresh_at(expires_at, window, now) {
        TokenState::NeedsRefresh
    } else {
        TokenState::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(offset_secs: i64, now: DateTime<Utc>) -> String {
        format_expiry(now + ChronoDuration::seconds(offset_secs))
    }

    #[test]
    fn missing_or_garbage_timestamps_are_expired() {
        let now = Utc::now();
        assert!(is_expired_at(None, now));
        assert!(is_expired_at(Some("not-a-date"), now));
        assert!(is_expired_at(Some(""), now));
        assert!(should_proactively_refresh_at(None, default_window(), now));
        assert!(should_proactively_refresh_at(
            Some("tomorrow"),
            default_window(),
            now
        ));
    }

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let now = Utc::now();
        let exact = format_expiry(now);
        assert!(is_expired_at(Some(&exact), now));
        assert!(!is_expired_at(Some(&at(1, now)), now));
    }

    #[test]
    fn classification_tracks_window() {
        let now = Utc::now();
        let window = default_window();
        assert_eq!(
            classify_at(Some(&at(3600, now)), window, now),
            TokenState::Valid
        );
        assert_eq!(
            classify_at(Some(&at(600, now)), window, now),
            TokenState::NeedsRefresh
        );
        assert_eq!(
            classify_at(Some(&at(-1, now)), window, now),
            TokenState::Expired
        );
        assert_eq!(classify_at(None, window, now), TokenState::Expired);
    }

    #[test]
    fn accepts_offsets_other_than_utc() {
        let now = parse_rfc3339("2026-01-01T12:00:00Z").expect("now");
        assert!(!is_expired_at(Some("2026-01-01T14:30:00+02:00"), now));
        assert!(is_expired_at(Some("2026-01-01T13:30:00+02:00"), now));
    }

    #[test]
    fn expires_in_is_relative_to_now() {
        let now = parse_rfc3339("2026-01-01T00:00:00Z").expect("now");
        assert_eq!(
            expires_in_at(7200, now).as_deref(),
            Some("2026-01-01T02:00:00Z")
        );
    }

    #[test]
    fn out_of_range_lifetimes_have_no_expiry() {
        let now = Utc::now();
        assert_eq!(expires_in_at(i64::MAX, now), None);
        assert_eq!(expires_in_at(100_000_000_000_000, now), None);
        assert_eq!(expires_in_at(i64::MIN, now), None);
    }

    proptest! {
        #[test]
        fn past_instants_are_always_expired(offset in 0i64..10_000_000) {
            let now = Utc::now();
            let value = at(-offset, now);
            prop_assert!(is_expired_at(Some(&value), now));
            prop_assert!(should_proactively_refresh_at(Some(&value), default_window(), now));
        }

        #[test]
        fn instants_beyond_window_need_no_refresh(offset in 1i64..10_000_000) {
            let now = Utc::now();
            let value = at(PROACTIVE_REFRESH_WINDOW_MINUTES * 60 + offset, now);
            prop_assert!(!should_proactively_refresh_at(Some(&value), default_window(), now));
            prop_assert!(!is_expired_at(Some(&value), now));
        }

        #[test]
        fn formatting_is_lossless(offset in -100_000i64..100_000, nanos in 0u32..1_000_000_000) {
            let now = Utc::now();
            let instant = now + ChronoDuration::seconds(offset) + ChronoDuration::nanoseconds(nanos as i64);
            let formatted = format_expiry(instant);
            prop_assert_eq!(parse_rfc3339(&formatted), Some(instant));
        }
    }
}
