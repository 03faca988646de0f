use std::sync::Arc;

use clap::Parser;
use sensible_server::config::{Cli, ServerConfig};
use sensible_server::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = ServerConfig::load(&cli)?;

    // Handlers resolve everything relative to the document root
    std::env::set_current_dir(&cfg.document_root)?;
    tracing::info!(
        document_root = %cfg.document_root.display(),
        cgi = cfg.cgi_enabled,
        "Serving content"
    );

    tokio::select! {
        res = server::listener::run(Arc::new(cfg)) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
