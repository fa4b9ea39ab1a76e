// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dialdesk serve` and `dialdesk dispatch-once`.
//!
//! Both open storage and the telephony adapter from config. `serve` then
//! runs the HTTP API and the dispatch loop until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dialdesk_config::DialdeskConfig;
use dialdesk_core::{DialdeskError, StorageAdapter, TelephonyAdapter};
use dialdesk_gateway::{ApiState, AuthConfig, ServerConfig};
use dialdesk_scheduler::{CallScheduler, Directory, DispatchRunner, TickSummary};
use dialdesk_storage::SqliteStorage;
use dialdesk_telephony::HttpTelephony;
use tracing::{error, info, warn};

use crate::shutdown;

/// Storage, telephony and the services built on them.
struct Services {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    telephony: Arc<dyn TelephonyAdapter + Send + Sync>,
    scheduler: Arc<CallScheduler>,
    directory: Arc<Directory>,
    runner: Arc<DispatchRunner>,
}

async fn open_services(config: &DialdeskConfig) -> Result<Services, DialdeskError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter + Send + Sync> = Arc::new(storage);
    info!(path = %config.storage.database_path, "storage initialized");

    let http = HttpTelephony::new(&config.telephony)?;
    if http.is_configured() {
        info!("telephony adapter initialized");
    }
    let telephony: Arc<dyn TelephonyAdapter + Send + Sync> = Arc::new(http);

    let scheduler = Arc::new(CallScheduler::new(storage.clone(), &config.scheduling));
    let directory = Arc::new(Directory::new(storage.clone()));
    let runner = Arc::new(DispatchRunner::new(
        storage.clone(),
        telephony.clone(),
        &config.scheduling,
        &config.dispatch,
    ));

    Ok(Services {
        storage,
        telephony,
        scheduler,
        directory,
        runner,
    })
}

/// Runs the API server and, when enabled, the dispatch loop.
pub async fn run_serve(config: DialdeskConfig) -> Result<(), DialdeskError> {
    init_tracing(&config.logging.level);

    let services = open_services(&config).await?;
    let cancel = shutdown::install_signal_handler();

    if config.server.bearer_token.is_none() {
        warn!("no server.bearer_token configured; authenticated API routes will reject every request");
    }

    let dispatch_handle = if config.dispatch.enabled {
        let runner = services.runner.clone();
        let poll_interval = Duration::from_secs(config.dispatch.poll_interval_secs);
        let cancel = cancel.clone();
        Some(tokio::spawn(async move {
            runner.run(poll_interval, cancel).await;
        }))
    } else {
        info!("dispatch loop disabled by configuration");
        None
    };

    let state = ApiState {
        scheduler: services.scheduler.clone(),
        directory: services.directory.clone(),
        runner: services.runner.clone(),
        storage: services.storage.clone(),
        telephony: services.telephony.clone(),
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        bearer_token: config.server.bearer_token.clone(),
    };

    info!("dialdesk ready");
    let served = dialdesk_gateway::start_server(&server_config, state, cancel.clone()).await;

    // A bind failure returns before any signal; stop the loop as well.
    cancel.cancel();
    if let Some(handle) = dispatch_handle
        && let Err(e) = handle.await
    {
        error!(error = %e, "dispatch loop task failed");
    }

    if let Err(e) = services.storage.close().await {
        error!(error = %e, "failed to close storage");
    }
    info!("dialdesk stopped");
    served
}

/// Runs one dispatch pass against the current time and prints the counts.
pub async fn run_dispatch_once(config: DialdeskConfig) -> Result<(), DialdeskError> {
    init_tracing(&config.logging.level);

    let services = open_services(&config).await?;
    let result = services.runner.tick(Utc::now()).await;

    if let Err(e) = services.storage.close().await {
        error!(error = %e, "failed to close storage");
    }
    let summary = result?;
    println!("{}", format_summary(&summary));
    Ok(())
}

fn format_summary(summary: &TickSummary) -> String {
    format!(
        "due={} completed={} retrying={} failed={} discarded={}",
        summary.due, summary.completed, summary.retrying, summary.failed, summary.discarded
    )
}

/// Initialize the tracing subscriber with the configured log level.
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dialdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
