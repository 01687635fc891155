use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{require, AuthError, Result};
use crate::lifecycle::{classify, default_window, TokenState};
use crate::refresh::{ClientTokenRefresher, DeviceTokenRefresher};
use crate::settings::Settings;
use crate::store::{
    normalize_controller, CredentialStore, FileCredentialStore, FileTokenStore, TokenRecord,
    TokenStore,
};

/// What a deployment command authenticates with.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthDescriptor {
    Bearer {
        token: String,
        controller: String,
    },
    #[serde(rename_all = "camelCase")]
    ClientCredentials {
        client_id: String,
        client_secret: String,
        controller: String,
    },
}

impl AuthDescriptor {
    pub fn controller(&self) -> &str {
        match self {
            AuthDescriptor::Bearer { controller, .. }
            | AuthDescriptor::ClientCredentials { controller, .. } => controller,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthDescriptor::Bearer { .. } => "bearer",
            AuthDescriptor::ClientCredentials { .. } => "client-credentials",
        }
    }
}

/// Picks a credential for a controller: device token, then client token, then raw
/// client credentials.
pub struct AuthResolver {
    client: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
    credentials: Arc<dyn CredentialStore>,
    window: ChronoDuration,
}

impl AuthResolver {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn TokenStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            tokens,
            credentials,
            window: default_window(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let resolver = Self::new(
            settings.http_client()?,
            Arc::new(FileTokenStore::new(&settings.tokens_file)),
            Arc::new(FileCredentialStore::new(&settings.secrets_file)),
        );
        Ok(resolver.with_window(settings.proactive_refresh_window))
    }

    pub fn with_window(mut self, window: ChronoDuration) -> Self {
        self.window = window;
        self
    }

    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    pub fn device_refresher(&self) -> DeviceTokenRefresher<'_> {
        DeviceTokenRefresher::new(&self.client, self.tokens.as_ref())
    }

    pub fn client_refresher(&self) -> ClientTokenRefresher<'_> {
        ClientTokenRefresher::new(&self.client, self.tokens.as_ref(), self.credentials.as_ref())
    }

    pub async fn get_deployment_auth(
        &self,
        controller: &str,
        environment: &str,
        app_name: &str,
    ) -> Result<AuthDescriptor> {
        let controller = normalize_controller(require(controller, "controller")?);
        let environment = require(environment, "environment")?;
        let app_name = require(app_name, "app_name")?;

        if let Some(token) = self.device_tier(&controller).await {
            return Ok(AuthDescriptor::Bearer { token, controller });
        }
        if let Some(token) = self.client_tier(&controller, environment, app_name).await {
            return Ok(AuthDescriptor::Bearer { token, controller });
        }
        if let Some(record) = self.credentials.load(app_name) {
            debug!(controller = %controller, app = %app_name, "using stored client credentials");
            return Ok(AuthDescriptor::ClientCredentials {
                client_id: record.client_id,
                client_secret: record.client_secret,
                controller,
            });
        }

        Err(AuthError::NoAuthenticationAvailable {
            controller,
            environment: environment.to_string(),
            app_name: app_name.to_string(),
        })
    }

    /// Device tier only, for actions reserved to interactively logged-in users.
    pub async fn get_device_only_auth(&self, controller: &str) -> Result<AuthDescriptor> {
        let controller = normalize_controller(require(controller, "controller")?);
        match self.device_tier(&controller).await {
            Some(token) => Ok(AuthDescriptor::Bearer { token, controller }),
            None => Err(AuthError::InteractiveLoginRequired { controller }),
        }
    }

    async fn device_tier(&self, controller: &str) -> Option<String> {
        let Some(record) = self.tokens.get_device_token(controller) else {
            debug!(controller = %controller, "no device token");
            return None;
        };
        if self.is_fresh(&record) {
            debug!(controller = %controller, "using stored device token");
            return Some(record.token);
        }
        let Some(refresh_token) = record
            .refresh_token
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        else {
            debug!(controller = %controller, "device token stale and no refresh token stored");
            return None;
        };
        match self.device_refresher().refresh(controller, refresh_token).await {
            Ok(record) => Some(record.token),
            Err(err) => {
                warn!(controller = %controller, "device token refresh failed: {err}");
                None
            }
        }
    }

    async fn client_tier(
        &self,
        controller: &str,
        environment: &str,
        app_name: &str,
    ) -> Option<String> {
        let Some(record) = self
            .tokens
            .get_client_token(environment, app_name)
            .filter(|record| record.issued_for(controller))
        else {
            debug!(environment = %environment, app = %app_name, "no client token for controller");
            return None;
        };
        if self.is_fresh(&record) {
            debug!(environment = %environment, app = %app_name, "using stored client token");
            return Some(record.token);
        }
        match self
            .client_refresher()
            .refresh(environment, app_name, controller, None, None)
            .await
        {
            Ok(record) => Some(record.token),
            Err(err @ AuthError::CredentialsNotFound { .. }) => {
                debug!(environment = %environment, app = %app_name, "{err}");
                None
            }
            Err(err) => {
                warn!(environment = %environment, app = %app_name, "client token refresh failed: {err}");
                None
            }
        }
    }

    fn is_fresh(&self, record: &TokenRecord) -> bool {
        classify(record.expires_at(), self.window) == TokenState::Valid
    }
}
