//! Redeployer
//!
//! Webhook receiver that rolls freshly built image tags out to orchestrator
//! service jobs.
//!
//! Startup order:
//! - Configuration and logging
//! - Bind the listener (plain TCP on 8080, or TLS on 8081 when TLS_CN is set)
//! - Build the orchestrator client
//! - Start the updater, then serve until a shutdown signal arrives

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span};

use redeployer::api::{self, AppState};
use redeployer::config::Config;
use redeployer::logging;
use redeployer::queue::notification_queue;
use redeployer::server::{BoundListener, serve};
use redeployer::updater::Updater;
use redeployer_client::{ClientConfig, NomadClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let _log_guard = logging::init(config.log_format);

    info!("Starting Redeployer");

    let listener = BoundListener::bind(&config).await?;
    info!(
        transport = config.transport(),
        port = config.port(),
        "listener started"
    );

    let client = match NomadClient::new(ClientConfig::from_env()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to start orchestrator client");
            return Ok(());
        }
    };
    info!(address = %client.base_url(), "orchestrator client initialized");

    let cancel = CancellationToken::new();
    let (sender, receiver) = notification_queue();

    let updater = Updater::new(Arc::new(client), info_span!("updater"));
    let worker = tokio::spawn({
        let cancel = cancel.clone();
        async move { updater.run(receiver, cancel).await }
    });

    tokio::spawn(shutdown_signal(cancel.clone()));

    let app = api::create_router(AppState::new(sender, info_span!("listener")));
    let served = serve(listener, app, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = worker.await {
        error!(error = %e, "updater task failed");
    }

    served.context("Server error")
}

/// Cancels `cancel` on Ctrl-C or SIGTERM
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    cancel.cancel();
}
