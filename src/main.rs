// src/main.rs
use anyhow::{Context, Result as AnyhowResult};
use dotenvy::dotenv;
use ethers::providers::{Http, Provider};
use spa_stats_api::config::Config;
use spa_stats_api::{AbiFetcher, AppContext, ChainLoader, ContractBinder, StatsProvider, router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::load().context("loading configuration")?;
    let port = spa_stats_api::config::port()?;

    let provider = Arc::new(
        Provider::<Http>::try_from(config.provider.host.as_str())
            .context("invalid provider host")?,
    );
    let fetcher = AbiFetcher::from_config(&config)?;
    let loader = ChainLoader::new(ContractBinder::new(fetcher, provider), &config);

    let ctx = Arc::new(AppContext::new(StatsProvider::new(loader)));
    let app = router(ctx.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "server ready");

    tokio::spawn(async move {
        if let Err(e) = ctx.provider.load().await {
            warn!(error = %e, "stats routes answer 503 until restart");
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}
