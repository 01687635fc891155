use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use super::fs::write_private_atomic;
use super::{client_id_key, client_secret_key, credential_pair, CredentialRecord, CredentialStore};
use crate::error::{AuthError, Result};

type SecretsMap = BTreeMap<String, Value>;

/// Flat YAML mapping of secret keys to values, e.g. `keycloak-client-idKeyVault: abc`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<SecretsMap> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), "secrets file not readable: {err}");
                return None;
            }
        };
        if contents.trim().is_empty() {
            return Some(SecretsMap::new());
        }
        match serde_yaml::from_str(&contents) {
            Ok(map) => Some(map),
            Err(err) => {
                debug!(path = %self.path.display(), "secrets file not parseable: {err}");
                None
            }
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, app_key: &str) -> Option<CredentialRecord> {
        let secrets = self.read()?;
        let client_id = secrets.get(&client_id_key(app_key)).and_then(scalar);
        let client_secret = secrets.get(&client_secret_key(app_key)).and_then(scalar);
        credential_pair(client_id.as_deref(), client_secret.as_deref())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AuthError::Validation { field: "key" });
        }
        let mut secrets = if self.path.exists() {
            let contents = fs::read_to_string(&self.path)
                .map_err(|err| AuthError::storage(&self.path, err))?;
            if contents.trim().is_empty() {
                SecretsMap::new()
            } else {
                serde_yaml::from_str(&contents).map_err(|err| {
                    AuthError::storage(&self.path, format!("existing file is not a mapping: {err}"))
                })?
            }
        } else {
            SecretsMap::new()
        };
        secrets.insert(key.to_string(), Value::String(value.to_string()));
        let contents =
            serde_yaml::to_string(&secrets).map_err(|err| AuthError::storage(&self.path, err))?;
        write_private_atomic(&self.path, &contents)?;
        debug!(path = %self.path.display(), key = %key, "stored secret");
        Ok(())
    }
}
