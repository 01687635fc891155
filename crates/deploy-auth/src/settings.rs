use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::lifecycle::PROACTIVE_REFRESH_WINDOW_MINUTES;

pub const HOME_ENV: &str = "DEPLOY_AUTH_HOME";
pub const SECRETS_FILE_ENV: &str = "DEPLOY_AUTH_SECRETS_FILE";
const HOME_DIR_NAME: &str = ".deploy-auth";
const CONFIG_FILE: &str = "config.json";
const SECRETS_FILE: &str = "secrets.local.yaml";
const TOKENS_FILE: &str = "tokens.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FileSettings {
    #[serde(default)]
    pub proactive_refresh_minutes: Option<i64>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,
    #[serde(default)]
    pub tokens_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub secrets_file: PathBuf,
    pub tokens_file: PathBuf,
    pub proactive_refresh_window: ChronoDuration,
    pub http_timeout: Duration,
}

impl Settings {
    /// Reads `config.json` under the resolved home directory. A missing file yields defaults;
    /// a malformed one is an error.
    pub fn load() -> Result<Self> {
        let home = home_dir()?;
        let secrets_override = std::env::var(SECRETS_FILE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(&home, secrets_override)
    }

    pub fn load_from(home: &Path, secrets_override: Option<PathBuf>) -> Result<Self> {
        let path = home.join(CONFIG_FILE);
        let file = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|err| AuthError::Config {
                message: format!("{}: {err}", path.display()),
            })?;
            serde_json::from_str(&contents).map_err(|err| AuthError::Config {
                message: format!("{}: {err}", path.display()),
            })?
        } else {
            FileSettings::default()
        };
        Self::from_file(home, file, secrets_override)
    }

    pub fn from_file(
        home: &Path,
        file: FileSettings,
        secrets_override: Option<PathBuf>,
    ) -> Result<Self> {
        let minutes = file
            .proactive_refresh_minutes
            .unwrap_or(PROACTIVE_REFRESH_WINDOW_MINUTES);
        let window = ChronoDuration::try_minutes(minutes)
            .filter(|window| *window >= ChronoDuration::zero())
            .ok_or_else(|| AuthError::Config {
                message: format!("proactive_refresh_minutes out of range: {minutes}"),
            })?;
        let timeout = file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(AuthError::Config {
                message: "http_timeout_secs must be positive".to_string(),
            });
        }
        Ok(Self {
            home: home.to_path_buf(),
            secrets_file: secrets_override
                .or(file.secrets_file)
                .unwrap_or_else(|| home.join(SECRETS_FILE)),
            tokens_file: file.tokens_file.unwrap_or_else(|| home.join(TOKENS_FILE)),
            proactive_refresh_window: window,
            http_timeout: Duration::from_secs(timeout),
        })
    }

    /// Shared client for every controller call; the timeout bounds each refresh.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|err| AuthError::Config {
                message: format!("failed to build http client: {err}"),
            })
    }
}

pub fn home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| AuthError::Config {
            message: "HOME is not set".to_string(),
        })?;
    Ok(Path::new(&home).join(HOME_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_config_file() {
        let dir = tempdir().expect("tempdir");
        let settings = Settings::load_from(dir.path(), None).expect("settings");
        assert_eq!(settings.secrets_file, dir.path().join("secrets.local.yaml"));
        assert_eq!(settings.tokens_file, dir.path().join("tokens.json"));
        assert_eq!(settings.proactive_refresh_window, ChronoDuration::minutes(15));
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.json"),
            r#"{"proactive_refresh_minutes": 5, "http_timeout_secs": 3, "tokens_file": "/tmp/t.json"}"#,
        )
        .expect("write config");
        let settings = Settings::load_from(dir.path(), Some(PathBuf::from("/tmp/s.yaml")))
            .expect("settings");
        assert_eq!(settings.proactive_refresh_window, ChronoDuration::minutes(5));
        assert_eq!(settings.http_timeout, Duration::from_secs(3));
        assert_eq!(settings.tokens_file, PathBuf::from("/tmp/t.json"));
        assert_eq!(settings.secrets_file, PathBuf::from("/tmp/s.yaml"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("config.json"), "{not json").expect("write config");
        let err = Settings::load_from(dir.path(), None).expect_err("should fail");
        assert!(matches!(err, AuthError::Config { .. }));
    }

    #[test]
    fn rejects_unrepresentable_window() {
        let dir = tempdir().expect("tempdir");
        for minutes in [-1, i64::MAX] {
            let file = FileSettings {
                proactive_refresh_minutes: Some(minutes),
                ..FileSettings::default()
            };
            let err = Settings::from_file(dir.path(), file, None).expect_err("should fail");
            assert!(matches!(err, AuthError::Config { .. }), "{minutes}");
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let dir = tempdir().expect("tempdir");
        let file = FileSettings {
            http_timeout_secs: Some(0),
            ..FileSettings::default()
        };
        assert!(Settings::from_file(dir.path(), file, None).is_err());
    }
}
