use reqwest::StatusCode;
use tracing::{debug, info};

use super::types::{DeviceRefreshRequest, DeviceRefreshResponse};
use super::{upstream_message, DEVICE_REFRESH_PATH};
use crate::error::{require, AuthError, Result, UNKNOWN_ERROR};
use crate::lifecycle::expires_in;
use crate::store::{normalize_controller, TokenRecord, TokenStore};

pub struct DeviceTokenRefresher<'a> {
    client: &'a reqwest::Client,
    tokens: &'a dyn TokenStore,
}

impl<'a> DeviceTokenRefresher<'a> {
    pub fn new(client: &'a reqwest::Client, tokens: &'a dyn TokenStore) -> Self {
        Self { client, tokens }
    }

    /// Exchanges `refresh_token` for a new access token and persists it. The returned record
    /// always carries a refresh token: the rotated one, or the one passed in.
    pub async fn refresh(&self, controller: &str, refresh_token: &str) -> Result<TokenRecord> {
        let controller = normalize_controller(require(controller, "controller")?);
        let refresh_token = require(refresh_token, "refresh_token")?;

        let url = format!("{controller}{DEVICE_REFRESH_PATH}");
        debug!(controller = %controller, "refreshing device token");
        let response = self
            .client
            .post(&url)
            .json(&DeviceRefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|err| match err.status() {
                Some(status) => classify_failure(&controller, status, ""),
                None => AuthError::refresh_failed(Some(err.to_string())),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(&controller, status, &body));
        }

        let auth: DeviceRefreshResponse = response.json().await.map_err(|err| {
            AuthError::refresh_failed(Some(format!("invalid refresh response: {err}")))
        })?;
        if auth.access_token.trim().is_empty() {
            return Err(AuthError::refresh_failed(Some(
                "refresh response carried no access token".to_string(),
            )));
        }

        let expires_at = expires_in(auth.expires_in).ok_or_else(|| {
            AuthError::refresh_failed(Some(format!(
                "refresh response expires_in out of range: {}",
                auth.expires_in
            )))
        })?;
        let refresh_token = auth
            .refresh_token
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| refresh_token.to_string());
        self.tokens.save_device_token(
            &controller,
            &auth.access_token,
            Some(&refresh_token),
            &expires_at,
        )?;
        info!(controller = %controller, expires_at = %expires_at, "device token refreshed");

        Ok(TokenRecord {
            controller,
            token: auth.access_token,
            refresh_token: Some(refresh_token),
            expires_at: Some(expires_at),
        })
    }
}

/// A 401 always means the refresh token is dead; otherwise the server's response body decides.
fn classify_failure(controller: &str, status: StatusCode, body: &str) -> AuthError {
    if status == StatusCode::UNAUTHORIZED || mentions_rejected_refresh(body) {
        return AuthError::RefreshTokenExpired {
            controller: controller.to_string(),
        };
    }
    let message = upstream_message(body).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
    AuthError::refresh_failed(Some(format!("{status}: {message}")))
}

fn mentions_rejected_refresh(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    let names_refresh_token =
        message.contains("refresh token") || message.contains("refresh_token");
    message.contains("invalid_grant")
        || (names_refresh_token && (message.contains("expired") || message.contains("invalid")))
}
