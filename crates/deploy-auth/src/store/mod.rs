mod credentials;
mod fs;
mod memory;
mod tokens;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use credentials::FileCredentialStore;
pub use memory::{MemoryCredentialStore, MemoryTokenStore};
pub use tokens::FileTokenStore;

/// Marks secret-store entries apart from plain configuration keys.
pub const SECRET_KEY_SUFFIX: &str = "KeyVault";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub controller: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl TokenRecord {
    /// Whether this record was issued against `controller`.
    pub fn issued_for(&self, controller: &str) -> bool {
        normalize_controller(&self.controller) == normalize_controller(controller)
    }

    pub fn expires_at(&self) -> Option<&str> {
        self.expires_at.as_deref()
    }
}

pub trait TokenStore: Send + Sync {
    fn get_device_token(&self, controller: &str) -> Option<TokenRecord>;
    fn get_client_token(&self, environment: &str, app_name: &str) -> Option<TokenRecord>;
    fn save_device_token(
        &self,
        controller: &str,
        token: &str,
        refresh_token: Option<&str>,
        expires_at: &str,
    ) -> Result<()>;
    fn save_client_token(
        &self,
        environment: &str,
        app_name: &str,
        controller: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<()>;
}

/// Reads never fail: an unusable store means "no credentials". Writes report errors.
pub trait CredentialStore: Send + Sync {
    fn load(&self, app_key: &str) -> Option<CredentialRecord>;
    fn save(&self, key: &str, value: &str) -> Result<()>;

    fn save_credentials(&self, app_key: &str, record: &CredentialRecord) -> Result<()> {
        self.save(&client_id_key(app_key), &record.client_id)?;
        self.save(&client_secret_key(app_key), &record.client_secret)
    }
}

pub fn client_id_key(app_key: &str) -> String {
    format!("{}-client-id{SECRET_KEY_SUFFIX}", app_key.trim())
}

pub fn client_secret_key(app_key: &str) -> String {
    format!("{}-client-secret{SECRET_KEY_SUFFIX}", app_key.trim())
}

pub fn normalize_controller(controller: &str) -> String {
    controller.trim().trim_end_matches('/').to_string()
}

/// Builds a record only when both halves are present and non-empty.
pub(crate) fn credential_pair(
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Option<CredentialRecord> {
    let client_id = client_id.map(str::trim).filter(|value| !value.is_empty())?;
    let client_secret = client_secret
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    Some(CredentialRecord {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}
