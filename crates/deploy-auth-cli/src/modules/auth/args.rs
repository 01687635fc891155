use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(long)]
    pub environment: String,
    #[arg(long)]
    pub app: String,
    #[arg(long, help = "Only accept an interactive device token")]
    pub device_only: bool,
    #[arg(long, help = "Print tokens and secrets unmasked")]
    pub reveal: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[arg(long, requires = "app")]
    pub environment: Option<String>,
    #[arg(long, requires = "environment")]
    pub app: Option<String>,
}

#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand)]
pub enum TokenCommand {
    #[command(about = "Exchange client credentials for a client token and store it")]
    Client(TokenClientArgs),
    #[command(about = "Refresh the stored device token with its refresh token")]
    RefreshDevice,
}

#[derive(Args)]
pub struct TokenClientArgs {
    #[arg(long)]
    pub environment: String,
    #[arg(long)]
    pub app: String,
    #[arg(long, requires = "client_secret")]
    pub client_id: Option<String>,
    #[arg(long, requires = "client_id")]
    pub client_secret: Option<String>,
}
