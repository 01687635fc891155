use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::auth::args::*;
pub use crate::modules::credentials::args::*;

#[derive(Parser)]
#[command(name = "deploy-auth")]
#[command(about = "Resolve and maintain credentials for a deployment controller")]
pub struct Cli {
    #[arg(long, env = "DEPLOY_AUTH_CONTROLLER", global = true)]
    pub controller: Option<String>,
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Print the credential a deployment would use")]
    Resolve(ResolveArgs),
    #[command(about = "Show stored token state without contacting the controller")]
    Status(StatusArgs),
    Token(TokenArgs),
    Credentials(CredentialsArgs),
}
