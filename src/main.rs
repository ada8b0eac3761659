#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, Context};
use authflow::{
    AuthSessionManager, AuthenticationServiceFactory, AuthflowSettings, ManualProvider,
    ProviderProfile,
};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "authflow")]
#[command(version)]
#[command(about = "Sign in with an identity provider and manage the local session")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the current sign-in state
    Status,
    /// Prints the session token; exits with 1 when signed out
    Token,
    /// Redeems a server auth code obtained out of band
    SignIn {
        /// Server auth code issued by the identity provider
        #[arg(long, env = "AUTHFLOW_SERVER_AUTH_CODE")]
        code: String,
        /// Email address of the account the code was issued for
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Avatar URL
        #[arg(long, default_value = "")]
        image_url: String,
        /// Provider-side account id
        #[arg(long, default_value = "")]
        id: String,
    },
    /// Signs out and removes the local session
    SignOut,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Also loads .env and initializes the logger
    let settings =
        AuthflowSettings::load().map_err(|e| anyhow!("Failed to load settings: {e}"))?;

    match cli.command {
        Commands::Status => {
            let manager = restored_manager(&settings, None).await?;
            match manager.get_user() {
                Some(user) => println!("{}: {} <{}>", manager.state(), user.name, user.email),
                None => println!("{}", manager.state()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Token => {
            let manager = restored_manager(&settings, None).await?;
            match manager.get_token() {
                Some(token) => {
                    println!("{token}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("Not signed in");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::SignIn {
            code,
            email,
            name,
            image_url,
            id,
        } => {
            let profile = ProviderProfile {
                id,
                email,
                name,
                image_url,
                server_auth_code: Some(code),
                ..Default::default()
            };
            let manager = restored_manager(&settings, Some(profile)).await?;
            let user = manager.sign_in().await.context("Sign-in failed")?;
            println!("Signed in as {} <{}>", user.name, user.email);
            Ok(ExitCode::SUCCESS)
        }
        Commands::SignOut => {
            let manager = restored_manager(&settings, None).await?;
            manager.sign_out().await.context("Sign-out failed")?;
            println!("Signed out");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Build a manager from settings and adopt any persisted session
async fn restored_manager(
    settings: &AuthflowSettings,
    profile: Option<ProviderProfile>,
) -> anyhow::Result<AuthSessionManager> {
    let provider_name = settings.provider.name.as_str();
    let provider = match profile {
        Some(profile) => ManualProvider::new(provider_name, profile),
        None => ManualProvider::without_profile(provider_name),
    };

    let manager = AuthenticationServiceFactory::create_session_manager(settings, provider)
        .context("Failed to configure authentication services")?;
    manager.restore().await;
    Ok(manager)
}
