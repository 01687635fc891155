use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    client_id_key, client_secret_key, credential_pair, normalize_controller, CredentialRecord,
    CredentialStore, TokenRecord, TokenStore,
};
use crate::error::{AuthError, Result};

/// Process-local token cache for embedding callers and tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    device: Mutex<HashMap<String, TokenRecord>>,
    clients: Mutex<HashMap<(String, String), TokenRecord>>,
    saves: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_device(&self, record: TokenRecord) {
        if let Ok(mut device) = self.device.lock() {
            device.insert(normalize_controller(&record.controller), record);
        }
    }

    pub fn insert_client(&self, environment: &str, app_name: &str, record: TokenRecord) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.insert((environment.to_string(), app_name.to_string()), record);
        }
    }

    /// Number of successful save calls since creation.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

fn poisoned() -> AuthError {
    AuthError::Storage {
        path: "<memory>".into(),
        message: "token store lock poisoned".to_string(),
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_device_token(&self, controller: &str) -> Option<TokenRecord> {
        let key = normalize_controller(controller);
        self.device
            .lock()
            .ok()?
            .get(&key)
            .filter(|record| record.issued_for(&key))
            .cloned()
    }

    fn get_client_token(&self, environment: &str, app_name: &str) -> Option<TokenRecord> {
        self.clients
            .lock()
            .ok()?
            .get(&(environment.to_string(), app_name.to_string()))
            .cloned()
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
        self.device.lock().map_err(|_| poisoned())?.insert(key, record);
        self.saves.fetch_add(1, Ordering::SeqCst);
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
        self.clients
            .lock()
            .map_err(|_| poisoned())?
            .insert((environment.to_string(), app_name.to_string()), record);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(app_key: &str, client_id: &str, client_secret: &str) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(client_id_key(app_key), client_id.to_string());
            entries.insert(client_secret_key(app_key), client_secret.to_string());
        }
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, app_key: &str) -> Option<CredentialRecord> {
        let entries = self.entries.lock().ok()?;
        credential_pair(
            entries.get(&client_id_key(app_key)).map(String::as_str),
            entries.get(&client_secret_key(app_key)).map(String::as_str),
        )
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
