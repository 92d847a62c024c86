mod cli;
mod config;
mod http;
mod services;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::http::middleware::auth::{issue_token, AuthError};
use crate::http::HttpError;
use crate::wiring::WiringError;
use postboard_infra::db::run_migrations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid cli: {0}")]
    InvalidCli(String),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] postboard_infra::db::DbPoolError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = config::AppConfig::from_env()?;

    if let Some(user_id) = cli.issue_token {
        let secret = config
            .token_secret
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::InvalidCli("issue-token requires POSTBOARD_TOKEN_SECRET".to_string())
            })?;
        let max_age = i64::try_from(config.token_max_age.as_secs()).unwrap_or(i64::MAX);
        println!("{}", issue_token(secret, user_id, max_age)?);
        return Ok(());
    }

    let state = wiring::build_state(config)?;
    if let Some(pool) = state.db.as_ref() {
        if cli.skip_migrations {
            info!("skipping database migrations");
        } else {
            run_migrations(pool).await?;
        }
    }

    let addr = state.config.http_addr;
    let api = tokio::spawn(async move {
        info!(%addr, store = state.store.kind(), "http server starting");
        http::serve(addr, state).await
    });

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        res = api => {
            res??;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}
