use clap::{Args, Subcommand};

#[derive(Args)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub command: CredentialsCommand,
}

#[derive(Subcommand)]
pub enum CredentialsCommand {
    Set(SetCredentialsArgs),
    Show(ShowCredentialsArgs),
}

#[derive(Args)]
pub struct SetCredentialsArgs {
    #[arg(long)]
    pub app: String,
    #[arg(long)]
    pub client_id: String,
    #[arg(long, env = "DEPLOY_AUTH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
}

#[derive(Args)]
pub struct ShowCredentialsArgs {
    #[arg(long)]
    pub app: String,
    #[arg(long)]
    pub reveal: bool,
}
