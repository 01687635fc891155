use clap::Parser;
use deploy_auth::Settings;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::Cli;
use crate::cli_command::handle_command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let settings = Settings::load()?;
    handle_command(cli.command, cli.controller, &settings).await
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
