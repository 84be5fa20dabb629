#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod actions;
mod cli;
mod config;
mod db;
mod slack;
mod utils;
mod web;

use cli::{Cli, Commands};
use config::Config;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(Config::load_from_file(&cli.config)?);
    utils::logging::init_tracing(&config.logging);

    match cli.command() {
        Commands::ValidateConfig => {
            info!("configuration {} is valid", cli.config.display());
            return Ok(());
        }
        Commands::Migrate => {
            let db_manager = db::DatabaseManager::new(&config.database)?;
            db_manager.migrate().await?;
            info!("database schema is up to date");
            return Ok(());
        }
        Commands::Serve => {}
    }

    info!("slack issue actions starting up");

    let db_manager = db::DatabaseManager::new(&config.database)?;
    db_manager.migrate().await?;

    let slack_client = slack::SlackClient::new(&config.slack)?;
    let service = Arc::new(actions::ActionService::new(
        &config,
        &db_manager,
        slack_client,
    ));

    let web_server = WebServer::new(config.clone(), service);
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });
    tokio::pin!(web_handle);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, beginning shutdown");
        },
        _ = &mut web_handle => {
            info!("web server task exited, beginning shutdown");
        },
    }

    web_handle.abort();

    info!("slack issue actions shutting down");
    Ok(())
}
