use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod config;
mod dashboard;
mod faceit;
mod live_matches;
mod ranking;

use config::Config;
use dashboard::AppState;
use faceit::{FaceitClient, StatsProvider};
use live_matches::{LiveMatchSync, SyncSettings, WsTransport};
use ranking::RankingView;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let stats: Arc<dyn StatsProvider> = Arc::new(FaceitClient::new(
        &config.api_base_url,
        config.http_timeout(),
    )?);
    info!("Stats API: {}", config.api_base_url);

    // One live feed per process; every dashboard client watches its output.
    let transport = Arc::new(WsTransport::new(
        &config.live_matches_ws_url,
        config.ping_interval(),
    ));
    let mut sync = LiveMatchSync::new(
        transport,
        Arc::clone(&stats),
        SyncSettings {
            reconnect_delay: config.reconnect_delay(),
        },
    );
    let live = sync.subscribe();
    sync.start();

    let dashboard_state = AppState {
        live,
        ranking: RankingView::new(Arc::clone(&stats), config.ranking_page_size),
        stats,
    };
    let app = dashboard::router(dashboard_state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server until Ctrl-C
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    sync.stop();
    sync.finished().await;
    let last = sync.snapshot();
    info!(
        "Live match sync closed ({} matches at revision {})",
        last.matches.len(),
        last.revision
    );

    Ok(())
}
