use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use apihub::{config::Config, ApiHub, ApiHubDb};
use apihub_server::{build_router, logging::init_logging, AppState};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "apihub-server", version, about = "Catalog, review and test public HTTP APIs")]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(long, short, global = true, env = "APIHUB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve {
        /// Overrides server.listen
        #[arg(long)]
        listen: Option<String>,
    },
    /// Reset the database and load the demo catalog
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(config.log.as_deref())?;

    match cli.command {
        Command::Serve { listen } => {
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            serve(config).await
        }
        Command::Seed => {
            let db = ApiHubDb::connect(&config.database)
                .await
                .context("failed to open database")?;
            let summary = db.seed().await.context("seeding failed")?;
            info!("seed complete: {} apis, {} reviews", summary.apis, summary.reviews);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let hub = ApiHub::new(&config)
        .await
        .context("failed to initialize api hub")?;
    let app = build_router(Arc::new(AppState { hub }), config.server.enable_cors);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("could not listen for ctrl-c: {}", e);
    }
    info!("shutdown requested");
}
