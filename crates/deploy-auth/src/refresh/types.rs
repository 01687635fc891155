use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Deserialize)]
pub struct DeviceRefreshResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(alias = "expiresIn")]
    pub expires_in: i64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientTokenResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ClientTokenResponse {
    pub fn failure_message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }
}
