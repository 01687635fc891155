use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info};

use super::types::ClientTokenResponse;
use super::{upstream_message, CLIENT_ID_HEADER, CLIENT_SECRET_HEADER, CLIENT_TOKEN_PATH};
use crate::error::{require, AuthError, Result};
use crate::lifecycle::{format_expiry, parse_rfc3339, DEFAULT_CLIENT_TOKEN_TTL_HOURS};
use crate::store::{
    credential_pair, normalize_controller, CredentialRecord, CredentialStore, TokenRecord,
    TokenStore,
};

pub struct ClientTokenRefresher<'a> {
    client: &'a reqwest::Client,
    tokens: &'a dyn TokenStore,
    credentials: &'a dyn CredentialStore,
}

impl<'a> ClientTokenRefresher<'a> {
    pub fn new(
        client: &'a reqwest::Client,
        tokens: &'a dyn TokenStore,
        credentials: &'a dyn CredentialStore,
    ) -> Self {
        Self {
            client,
            tokens,
            credentials,
        }
    }

    /// Obtains a client token for `(environment, app_name)`. Credentials not passed in are
    /// read from the credential store under `app_name`.
    pub async fn refresh(
        &self,
        environment: &str,
        app_name: &str,
        controller: &str,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<TokenRecord> {
        let environment = require(environment, "environment")?;
        let app_name = require(app_name, "app_name")?;
        let controller = normalize_controller(require(controller, "controller")?);

        let CredentialRecord {
            client_id,
            client_secret,
        } = credential_pair(client_id, client_secret)
            .or_else(|| self.credentials.load(app_name))
            .ok_or_else(|| AuthError::CredentialsNotFound {
                app_key: app_name.to_string(),
            })?;

        let url = format!("{controller}{CLIENT_TOKEN_PATH}");
        debug!(controller = %controller, environment = %environment, app = %app_name, "requesting client token");
        let response = self
            .client
            .post(&url)
            .header(CLIENT_ID_HEADER, client_id.as_str())
            .header(CLIENT_SECRET_HEADER, client_secret.as_str())
            .send()
            .await
            .map_err(|err| AuthError::refresh_failed(Some(err.to_string())))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::refresh_failed(upstream_message(&body)));
        }
        let payload: ClientTokenResponse = if body.trim().is_empty() {
            ClientTokenResponse::default()
        } else {
            serde_json::from_str(&body).map_err(|err| {
                AuthError::refresh_failed(Some(format!("invalid token response: {err}")))
            })?
        };
        if payload.success == Some(false) {
            return Err(AuthError::refresh_failed(payload.failure_message()));
        }
        let Some(token) = payload.token.clone().filter(|token| !token.trim().is_empty()) else {
            return Err(AuthError::refresh_failed(payload.failure_message()));
        };

        let expires_at = client_token_expiry(
            payload.expires_at.as_deref(),
            payload.expires_in,
            Utc::now(),
        );
        self.tokens
            .save_client_token(environment, app_name, &controller, &token, &expires_at)?;
        info!(environment = %environment, app = %app_name, expires_at = %expires_at, "client token refreshed");

        Ok(TokenRecord {
            controller,
            token,
            refresh_token: None,
            expires_at: Some(expires_at),
        })
    }
}

/// Absolute `expires_at` wins, then a positive representable `expires_in`, then the default
/// lifetime.
pub fn client_token_expiry(
    expires_at: Option<&str>,
    expires_in: Option<i64>,
    now: DateTime<Utc>,
) -> String {
    if let Some(value) = expires_at.filter(|value| parse_rfc3339(value).is_some()) {
        return value.trim().to_string();
    }
    if let Some(at) = expires_in
        .filter(|seconds| *seconds > 0)
        .and_then(ChronoDuration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
    {
        return format_expiry(at);
    }
    format_expiry(now + ChronoDuration::hours(DEFAULT_CLIENT_TOKEN_TTL_HOURS))
}
