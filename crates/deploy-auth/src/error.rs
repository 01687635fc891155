use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, AuthError>;

pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("{field} is required")]
    Validation { field: &'static str },
    #[error(
        "refresh token for {controller} is expired or invalid; run the interactive login flow again"
    )]
    RefreshTokenExpired { controller: String },
    #[error("token refresh failed: {message}")]
    RefreshFailed { message: String },
    #[error("client credentials not found for '{app_key}'")]
    CredentialsNotFound { app_key: String },
    #[error(
        "interactive login required for {controller}; log in to the controller and retry"
    )]
    InteractiveLoginRequired { controller: String },
    #[error(
        "no authentication available for {controller} (environment '{environment}', app '{app_name}'); log in interactively or configure client credentials for '{app_name}'"
    )]
    NoAuthenticationAvailable {
        controller: String,
        environment: String,
        app_name: String,
    },
    #[error("failed to write {}: {message}", .path.display())]
    Storage { path: PathBuf, message: String },
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl AuthError {
    pub(crate) fn refresh_failed(message: Option<String>) -> Self {
        let message = message
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        Self::RefreshFailed { message }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// True for conditions that tell the operator to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::RefreshTokenExpired { .. } | Self::InteractiveLoginRequired { .. }
        )
    }
}

pub(crate) fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation { field });
    }
    Ok(value)
}
