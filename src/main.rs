use clap::{Parser, Subcommand};
use mr_status::error::AppError;
use mr_status::services::credentials::TOKEN_ENV_VAR;
use mr_status::services::{
    dispatch, CredentialService, GitLabClient, GitLabClientConfig, LogNotifier, Poller,
};
use mr_status::settings::{AppSettings, SettingsStore, SETTINGS_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "mr-status")]
#[command(about = "Live merge request status across watched GitLab projects")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll watched repositories and log notifications (default)
    Watch,

    /// Manage the access token in the OS keychain
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Read a token from stdin, check it against GitLab and store it
    Store,
    /// Remove the stored token
    Delete,
    /// Check the token in use
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match SettingsStore::new(cli.settings).load() {
        Ok(settings) => match cli.command.unwrap_or(Commands::Watch) {
            Commands::Watch => watch(settings).await,
            Commands::Token { action } => token(settings, action).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn client(settings: &AppSettings, token: String) -> Result<GitLabClient, AppError> {
    GitLabClient::new(GitLabClientConfig {
        base_url: settings.gitlab_base_url.clone(),
        token,
        ..Default::default()
    })
}

async fn token(settings: AppSettings, action: TokenAction) -> Result<(), AppError> {
    let credentials = CredentialService::new();
    let url = &settings.gitlab_base_url;

    match action {
        TokenAction::Store => {
            let mut token = String::new();
            std::io::stdin()
                .read_line(&mut token)
                .map_err(|e| AppError::invalid_input(format!("Failed to read token: {}", e)))?;
            let token = token.trim().to_string();

            let user = client(&settings, token.clone())?.current_user().await?;
            credentials.store_token(url, &token)?;
            log::info!("Stored token for {} ({})", url, user.username);
        }
        TokenAction::Delete => {
            credentials.delete_token(url)?;
            log::info!("Removed token for {}", url);
        }
        TokenAction::Test => {
            let token = credentials.resolve_token(url, std::env::var(TOKEN_ENV_VAR).ok())?;
            let user = client(&settings, token)?.current_user().await?;
            log::info!("Token for {} belongs to {}", url, user.username);
        }
    }
    Ok(())
}

async fn watch(settings: AppSettings) -> Result<(), AppError> {
    let token = CredentialService::new().resolve_token(
        &settings.gitlab_base_url,
        std::env::var(TOKEN_ENV_VAR).ok(),
    )?;

    if !settings.is_configured(true) {
        return Err(AppError::invalid_input_field(
            "Add at least one repository to watch",
            "repositories",
        ));
    }

    let client = client(&settings, token)?;
    let user = client.current_user().await?;
    log::info!(
        "Signed in to {} as {}, watching {} repositories",
        client.base_url(),
        user.username,
        settings.repositories.len()
    );

    let poller = Poller::new(Arc::new(client), settings.poller_config());
    let mut transitions = poller.subscribe();
    poller.start_polling().await;

    let notifier = LogNotifier;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            batch = transitions.recv() => match batch {
                Ok(batch) => {
                    dispatch(&notifier, &batch);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Dropped {} transition batches", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.stop_polling().await;
    Ok(())
}
