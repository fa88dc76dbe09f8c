//! Task wiring for `warchestd run`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use warchest_core::WarchestConfig;
use warchest_engine::{DecisionEngine, EngineConfig};
use warchest_exec::ShellRunner;
use warchest_metrics::Gauges;
use warchest_rpc::{JsonRpcClient, Poller};

/// Run the controller until SIGINT or SIGTERM.
pub async fn run(config: WarchestConfig) -> anyhow::Result<()> {
    info!(
        pool = %config.pool_id,
        delegators = ?config.delegator_ids,
        rpc = %config.rpc_url,
        "warchest daemon starting"
    );

    let poll_interval = config.poll_interval()?;
    let gauges = Arc::new(Gauges::new());

    // ── Chain poller ───────────────────────────────────────────

    let client = JsonRpcClient::new(config.rpc_url.clone(), config.rpc_timeout()?)?;
    let poller = Poller::new(Arc::new(client), config.pool_id.clone(), poll_interval)
        .with_epoch_length(config.epoch_length);

    // ── Decision engine ────────────────────────────────────────

    let runner = Arc::new(ShellRunner::new(config.command_timeout()?));
    let engine = DecisionEngine::new(
        EngineConfig::from_config(&config),
        runner,
        config.commands.clone(),
        gauges.clone(),
    );

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tx, rx) = mpsc::unbounded_channel();

    let poller_shutdown = shutdown_rx.clone();
    let poller_handle = tokio::spawn(async move {
        poller.run(tx, poller_shutdown).await;
    });

    let engine_shutdown = shutdown_rx.clone();
    let engine_handle = tokio::spawn(async move {
        engine.run(rx, engine_shutdown).await;
    });

    // ── Metrics server ─────────────────────────────────────────

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {:?}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "metrics server listening");

    let router = warchest_api::build_router(gauges);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = poller_handle.await;
    let _ = engine_handle.await;

    info!("warchest daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
