use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use tracing::{debug, info};

use crate::{
    aws::{
        FederationClient, FederationConfig,
        credentials::{self, ExplicitCredentials, ResolveOptions, ResolvedCredentials},
    },
    browser::{self, FederationLoginInfo},
    constants,
    prompt::TerminalPrompter,
};

#[derive(Debug, Clone, Default, Args)]
pub struct LoginCommand {
    #[arg(long, value_name = "URL", help = "The console URL to navigate to after login")]
    pub destination_url: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        allow_negative_numbers = true,
        help = "Console session duration in seconds (default 14400)"
    )]
    pub duration: Option<i64>,

    #[arg(long, help = "AWS region, selects the partition and the STS region")]
    pub region: Option<String>,

    #[arg(long, help = "Temporary access key id")]
    pub access_key_id: Option<String>,

    #[arg(long, help = "Temporary secret access key")]
    pub secret_access_key: Option<String>,

    #[arg(long, help = "Temporary session token")]
    pub session_token: Option<String>,

    #[arg(long, conflicts_with = "no_browser", help = "Only print the sign-in URL")]
    pub print_only: bool,

    #[arg(long, help = "Write the sign-in page but do not open a browser")]
    pub no_browser: bool,
}

impl LoginCommand {
    pub async fn execute(self, profile: Option<&str>, config_path: Option<&Path>) -> Result<()> {
        let output = self.output();
        let explicit = ExplicitCredentials {
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            session_token: self.session_token,
        };
        let options = ResolveOptions {
            profile,
            config_path,
            region: self.region.as_deref(),
        };

        let prompter = TerminalPrompter::new();
        let resolved = credentials::resolve(explicit, options, &prompter).await?;
        debug!("Credential source: {:?}", resolved.source);

        let config = self
            .region
            .as_deref()
            .map_or_else(FederationConfig::default, FederationConfig::for_region);
        let client = FederationClient::new(config)?;

        let (destination, duration) =
            login_target(self.destination_url, self.duration, &resolved, client.config());

        let url = client
            .generate_federation_url(&resolved.credentials, Some(&destination), duration)
            .await
            .context("Failed to generate console sign-in URL")?;

        let login = FederationLoginInfo { url, destination };

        if output == LoginOutput::Url {
            println!("{}", login.url);
            return Ok(());
        }

        let page = browser::write_signin_page(&constants::build_dir(), &login).await?;

        if output == LoginOutput::Page {
            println!("Sign-in page: {}", page.display());
            return Ok(());
        }

        browser::open_browser(&browser::file_url(&page)?)?;
        info!("Opened AWS Management Console sign-in page in browser");
        println!("Opening {} in your browser.", login.destination);

        Ok(())
    }

    fn output(&self) -> LoginOutput {
        if self.print_only {
            LoginOutput::Url
        } else if self.no_browser {
            LoginOutput::Page
        } else {
            LoginOutput::Browser
        }
    }
}

/// What a login hands back to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginOutput {
    /// Print the sign-in URL on stdout
    Url,
    /// Write the sign-in page and print its path
    Page,
    /// Write the sign-in page and open it
    Browser,
}

/// Destination and duration for a login
///
/// Command line values win over the profile's, and the destination falls
/// back to the console root. A `None` duration means the client default.
fn login_target(
    cli_destination: Option<String>,
    cli_duration: Option<i64>,
    resolved: &ResolvedCredentials,
    config: &FederationConfig,
) -> (String, Option<i64>) {
    let destination = cli_destination
        .or_else(|| resolved.destination.clone())
        .unwrap_or_else(|| config.console_root.clone());
    let duration = cli_duration.or(resolved.duration);

    (destination, duration)
}
