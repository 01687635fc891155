mod client;
mod device;
pub(crate) mod types;

pub use client::{client_token_expiry, ClientTokenRefresher};
pub use device::DeviceTokenRefresher;

pub const DEVICE_REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub const CLIENT_TOKEN_PATH: &str = "/api/v1/auth/token";
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const CLIENT_SECRET_HEADER: &str = "x-client-secret";

/// Pulls a human-readable message out of an error body, whatever shape it has.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(body.chars().take(200).collect());
    };
    ["message", "error_description", "error"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string),
            _ => None,
        })
}

/// Accepts connections into the backlog but never answers them.
#[cfg(test)]
pub(crate) fn silent_controller() -> (std::net::TcpListener, String) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    (listener, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_messages_from_common_shapes() {
        assert_eq!(upstream_message(""), None);
        assert_eq!(
            upstream_message(r#"{"message": "token revoked"}"#).as_deref(),
            Some("token revoked")
        );
        assert_eq!(
            upstream_message(r#"{"error": "invalid_grant", "error_description": "Refresh token expired"}"#)
                .as_deref(),
            Some("Refresh token expired")
        );
        assert_eq!(
            upstream_message(r#"{"error": {"message": "nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(upstream_message(r#"{"ok": true}"#), None);
        assert_eq!(upstream_message("gateway down").as_deref(), Some("gateway down"));
    }
}
