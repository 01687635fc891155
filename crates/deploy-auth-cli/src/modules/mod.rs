pub(crate) mod auth;
pub(crate) mod credentials;

pub(crate) fn require_controller(controller: Option<String>) -> anyhow::Result<String> {
    controller
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("controller not set (--controller or DEPLOY_AUTH_CONTROLLER)"))
}

pub(crate) fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
