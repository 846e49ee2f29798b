pub mod common;
pub mod config;
pub mod heuristics;
pub mod inference;
pub mod proxy;
pub mod ratelimit;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::BriefingConfig;
use inference::{InferenceService, WorkerPool};
use proxy::handlers::HandlerRegistry;
use proxy::{ProxyError, ProxyServer};
use ratelimit::RateLimiter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Periodically drop rate-limiter keys that have gone quiet
fn spawn_sweeper(limiter: Arc<RateLimiter>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.sweep();
        }
    });
}

/// Run the daemon until interrupted
pub async fn run() -> Result<(), ProxyError> {
    init_tracing();

    let config = BriefingConfig::load()?;
    let socket_path = config.socket_path()?;

    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let inference = InferenceService::from_config(&config.inference)?;
    let helpers = WorkerPool::new("helpers", config.inference.helper_workers)?;

    inference.start();
    if config.inference.preload_blocking {
        info!("Waiting for summarization model before accepting connections");
        let state = inference.wait_until_settled().await;
        info!("Summarization model settled: {}", state.as_str());
    }

    spawn_sweeper(Arc::clone(&limiter), config.rate_limit.sweep_interval_secs);

    let handlers = Arc::new(HandlerRegistry::new(
        limiter,
        inference,
        helpers,
        config.inference.default_max_length,
    ));
    let server = Arc::new(ProxyServer::new(socket_path, handlers));

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                signal_server.shutdown();
            }
            Err(e) => warn!("Could not listen for interrupt: {}", e),
        }
    });

    info!(
        "Starting briefingd {} at {:?}",
        env!("CARGO_PKG_VERSION"),
        server.socket_path()
    );
    server.start().await?;

    Ok(())
}
