//! Credential resolution for calls to a deployment controller.
//!
//! [`AuthResolver`] walks three tiers in order: an interactive device token (refreshed with
//! its refresh token when stale), a client token for the `(environment, app)` pair, and
//! finally the raw client id/secret from the local secrets file.

pub mod error;
pub mod lifecycle;
pub mod refresh;
pub mod resolver;
pub mod settings;
pub mod store;

pub use error::{AuthError, Result};
pub use lifecycle::TokenState;
pub use refresh::{ClientTokenRefresher, DeviceTokenRefresher};
pub use resolver::{AuthDescriptor, AuthResolver};
pub use settings::Settings;
pub use store::{
    CredentialRecord, CredentialStore, FileCredentialStore, FileTokenStore, MemoryCredentialStore,
    MemoryTokenStore, TokenRecord, TokenStore,
};

/// Resolves auth with the on-disk stores and settings of the current user.
pub async fn resolve_auth(
    controller: &str,
    environment: &str,
    app_name: &str,
) -> Result<AuthDescriptor> {
    let settings = Settings::load()?;
    AuthResolver::from_settings(&settings)?
        .get_deployment_auth(controller, environment, app_name)
        .await
}
