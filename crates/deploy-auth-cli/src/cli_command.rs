use deploy_auth::Settings;

use crate::cli_args::Command;
use crate::modules::auth::{handle_resolve, handle_status, handle_token_command};
use crate::modules::credentials::handle_credentials_command;

pub(crate) async fn handle_command(
    command: Command,
    controller: Option<String>,
    settings: &Settings,
) -> anyhow::Result<()> {
    match command {
        Command::Resolve(args) => handle_resolve(args, controller, settings).await,
        Command::Status(args) => handle_status(args, controller, settings),
        Command::Token(args) => handle_token_command(args, controller, settings).await,
        Command::Credentials(args) => handle_credentials_command(args, settings),
    }
}
