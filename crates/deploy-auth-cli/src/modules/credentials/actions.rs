use deploy_auth::{CredentialRecord, CredentialStore, FileCredentialStore, Settings};
use tracing::info;

use super::args::{CredentialsArgs, CredentialsCommand};
use crate::modules::mask_secret;

pub(crate) fn handle_credentials_command(
    args: CredentialsArgs,
    settings: &Settings,
) -> anyhow::Result<()> {
    let store = FileCredentialStore::new(&settings.secrets_file);
    match args.command {
        CredentialsCommand::Set(args) => {
            if args.client_id.trim().is_empty() || args.client_secret.trim().is_empty() {
                anyhow::bail!("client id and client secret must not be empty");
            }
            store.save_credentials(
                &args.app,
                &CredentialRecord {
                    client_id: args.client_id.trim().to_string(),
                    client_secret: args.client_secret.trim().to_string(),
                },
            )?;
            info!(app = %args.app, path = %store.path().display(), "stored client credentials");
            println!("stored client credentials for {}", args.app);
        }
        CredentialsCommand::Show(args) => {
            let record = store.load(&args.app).ok_or_else(|| {
                anyhow::anyhow!("client credentials not found for '{}'", args.app)
            })?;
            let secret = if args.reveal {
                record.client_secret
            } else {
                mask_secret(&record.client_secret)
            };
            println!("client id: {}", record.client_id);
            println!("client secret: {secret}");
        }
    }
    Ok(())
}
