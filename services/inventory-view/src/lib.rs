//! Inventory View - dashboard view controller for a distributed inventory service
//!
//! Reads inventory records from the inventory service, keeps them as view
//! state, polls for updates and forwards orders, shipments and other actions.

pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod inventory;
pub mod io;
pub mod poller;
pub mod state;

pub use config::{load_config, Config, Variant};
pub use controller::{InventoryController, Mutation, MutationReport, RefreshOutcome};
pub use error::{InventoryError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::ReqwestHttpClient;

/// Run the inventory view with the given configuration until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    run_until(config, cancel).await
}

/// Run the inventory view until `cancel` fires
pub async fn run_until(config: Config, cancel: CancellationToken) -> Result<()> {
    config.validate()?;

    let http: Arc<dyn io::HttpClient> =
        Arc::new(ReqwestHttpClient::with_timeout(config.request_timeout())?);
    let controller = Arc::new(InventoryController::new(&config, http));
    let poll = config.poll_settings();

    // Initial load
    if config.variant.has_name() {
        if let Err(e) = controller.fetch_name().await {
            tracing::warn!("Could not read branch name: {}", e);
        }
    }
    let outcome = controller.reload().await;
    tracing::info!("Initial inventory load: {:?}", outcome);

    let poller = if poll.enabled {
        Some(poller::start(Arc::clone(&controller), &poll, &cancel))
    } else {
        tracing::debug!("Polling disabled");
        None
    };

    let dashboard_task = if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let router = dashboard::build_router(Arc::clone(&controller), poll.rundown_delay());
        let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Dashboard listening on http://{}", addr);

        let cancel_for_dashboard = cancel.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();
            tracing::debug!("Dashboard stopped");
        }))
    } else {
        None
    };

    tracing::info!("Inventory view started");
    cancel.cancelled().await;

    if let Some(poller) = poller {
        poller.stop().await;
    }
    if let Some(task) = dashboard_task {
        let _ = task.await;
    }

    tracing::info!("Inventory view stopped");
    Ok(())
}
