use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{CompletionsCommand, LoginCommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "aws-federation-login", version, about = "Open the AWS Management Console with temporary role credentials", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        help = "Profile name in the profile file (prompted for when several exist)"
    )]
    pub profile: Option<String>,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "PATH",
        help = "Profile file to use instead of the discovered one"
    )]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Generate a console sign-in URL and open it in the browser")]
    Login(LoginCommand),
    #[command(about = "Generate shell completion scripts for aws-federation-login")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or_else(|| Commands::Login(LoginCommand::default()));

        match command {
            Commands::Login(cmd) => cmd.execute(self.profile.as_deref(), self.config.as_deref()).await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}
