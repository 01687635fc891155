use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fs::write_private_atomic;
use super::{normalize_controller, TokenRecord, TokenStore};
use crate::error::{AuthError, Result};

#[derive(Serialize, Deserialize, Default)]
struct TokenFile {
    #[serde(default)]
    device: BTreeMap<String, TokenRecord>,
    #[serde(default)]
    clients: BTreeMap<String, BTreeMap<String, TokenRecord>>,
}

/// JSON token cache: device tokens keyed by controller, client tokens by environment then app.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<TokenFile> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(file) => Some(file),
            Err(err) => {
                debug!(path = %self.path.display(), "token cache not parseable: {err}");
                None
            }
        }
    }

    fn update(&self, apply: impl FnOnce(&mut TokenFile)) -> Result<()> {
        let mut file = match self.read() {
            Some(file) => file,
            None => {
                if self.path.exists() {
                    warn!(path = %self.path.display(), "replacing unreadable token cache");
                }
                TokenFile::default()
            }
        };
        apply(&mut file);
        let contents =
            serde_json::to_string_pretty(&file).map_err(|err| AuthError::storage(&self.path, err))?;
        write_private_atomic(&self.path, &contents)
    }
}

impl TokenStore for FileTokenStore {
    fn get_device_token(&self, controller: &str) -> Option<TokenRecord> {
        let key = normalize_controller(controller);
        self.read()?
            .device
            .remove(&key)
            .filter(|record| record.issued_for(&key))
    }

    fn get_client_token(&self, environment: &str, app_name: &str) -> Option<TokenRecord> {
        self.read()?
            .clients
            .remove(environment.trim())?
            .remove(app_name.trim())
    }

    fn save_device_token(
        &self,
        controller: &str,
        token: &str,
        refresh_token: Option<&str>,
        expires_at: &str,
    ) -> Result<()> {
        let key = normalize_controller(controller);
        let record = TokenRecord {
            controller: key.clone(),
            token: token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: Some(expires_at.to_string()),
        };
        self.update(|file| {
            file.device.insert(key, record);
        })?;
        debug!(controller = %controller, "stored device token");
        Ok(())
    }

    fn save_client_token(
        &self,
        environment: &str,
        app_name: &str,
        controller: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        let record = TokenRecord {
            controller: normalize_controller(controller),
            token: token.to_string(),
            refresh_token: None,
            expires_at: Some(expires_at.to_string()),
        };
        self.update(|file| {
            file.clients
                .entry(environment.trim().to_string())
                .or_default()
                .insert(app_name.trim().to_string(), record);
        })?;
        debug!(environment = %environment, app = %app_name, "stored client token");
        Ok(())
    }
}
