use chrono::Duration as ChronoDuration;
use deploy_auth::lifecycle::classify;
use deploy_auth::{
    AuthDescriptor, AuthError, AuthResolver, CredentialStore, FileCredentialStore, FileTokenStore,
    Settings, TokenRecord, TokenStore,
};
use serde_json::json;
use tracing::debug;

use super::args::{ResolveArgs, StatusArgs, TokenArgs, TokenCommand};
use crate::modules::{mask_secret, require_controller};

pub(crate) async fn handle_resolve(
    args: ResolveArgs,
    controller: Option<String>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let controller = require_controller(controller)?;
    let resolver = AuthResolver::from_settings(settings)?;
    let auth = if args.device_only {
        resolver.get_device_only_auth(&controller).await?
    } else {
        resolver
            .get_deployment_auth(&controller, &args.environment, &args.app)
            .await?
    };
    debug!(kind = auth.kind(), controller = %auth.controller(), "resolved auth");
    println!("{}", serde_json::to_string_pretty(&render(&auth, args.reveal))?);
    Ok(())
}

fn render(auth: &AuthDescriptor, reveal: bool) -> serde_json::Value {
    let hide = |value: &str| {
        if reveal {
            value.to_string()
        } else {
            mask_secret(value)
        }
    };
    match auth {
        AuthDescriptor::Bearer { token, controller } => json!({
            "type": auth.kind(),
            "token": hide(token),
            "controller": controller,
        }),
        AuthDescriptor::ClientCredentials {
            client_id,
            client_secret,
            controller,
        } => json!({
            "type": auth.kind(),
            "clientId": client_id,
            "clientSecret": hide(client_secret),
            "controller": controller,
        }),
    }
}

pub(crate) fn handle_status(
    args: StatusArgs,
    controller: Option<String>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let controller = require_controller(controller)?;
    let tokens = FileTokenStore::new(&settings.tokens_file);
    let window = settings.proactive_refresh_window;

    let device = tokens.get_device_token(&controller);
    println!("device: {}", describe(device.as_ref(), window));
    if let Some(record) = device.as_ref() {
        let stored = record
            .refresh_token
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        println!("refresh token: {}", if stored { "stored" } else { "missing" });
    }

    if let (Some(environment), Some(app)) = (args.environment, args.app) {
        let client = tokens
            .get_client_token(&environment, &app)
            .filter(|record| record.issued_for(&controller));
        println!(
            "client token ({environment}/{app}): {}",
            describe(client.as_ref(), window)
        );
        let credentials = FileCredentialStore::new(&settings.secrets_file).load(&app);
        println!(
            "credentials ({app}): {}",
            if credentials.is_some() { "stored" } else { "missing" }
        );
    }
    Ok(())
}

fn describe(record: Option<&TokenRecord>, window: ChronoDuration) -> String {
    let Some(record) = record else {
        return "missing".to_string();
    };
    let state = classify(record.expires_at(), window);
    match record.expires_at() {
        Some(expires_at) => format!("{} (expires {expires_at})", state.as_str()),
        None => state.as_str().to_string(),
    }
}

pub(crate) async fn handle_token_command(
    args: TokenArgs,
    controller: Option<String>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let controller = require_controller(controller)?;
    let resolver = AuthResolver::from_settings(settings)?;
    match args.command {
        TokenCommand::Client(args) => {
            let record = resolver
                .client_refresher()
                .refresh(
                    &args.environment,
                    &args.app,
                    &controller,
                    args.client_id.as_deref(),
                    args.client_secret.as_deref(),
                )
                .await?;
            println!(
                "stored client token for {}/{} (expires {})",
                args.environment,
                args.app,
                record.expires_at().unwrap_or("unknown")
            );
        }
        TokenCommand::RefreshDevice => {
            let refresh_token = resolver
                .tokens()
                .get_device_token(&controller)
                .and_then(|record| record.refresh_token)
                .ok_or_else(|| AuthError::InteractiveLoginRequired {
                    controller: controller.clone(),
                })?;
            let record = resolver
                .device_refresher()
                .refresh(&controller, &refresh_token)
                .await?;
            println!(
                "refreshed device token for {} (expires {})",
                record.controller,
                record.expires_at().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_unless_revealed() {
        let auth = AuthDescriptor::ClientCredentials {
            client_id: "abc".to_string(),
            client_secret: "supersecret".to_string(),
            controller: "https://ctl.example.com".to_string(),
        };
        assert_eq!(render(&auth, false)["clientSecret"], "supe****");
        assert_eq!(render(&auth, true)["clientSecret"], "supersecret");
        assert_eq!(render(&auth, true)["type"], "client-credentials");
    }

    #[test]
    fn describe_reports_missing_and_expired() {
        let window = deploy_auth::lifecycle::default_window();
        assert_eq!(describe(None, window), "missing");
        let record = TokenRecord {
            controller: "https://ctl".to_string(),
            token: "t".to_string(),
            refresh_token: None,
            expires_at: Some("2000-01-01T00:00:00Z".to_string()),
        };
        assert_eq!(
            describe(Some(&record), window),
            "expired (expires 2000-01-01T00:00:00Z)"
        );
    }
}
