// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tandem serve` command implementation.
//!
//! Wires config -> storage -> engine -> gateway and runs the accept loop
//! until a shutdown signal arrives.

use std::sync::Arc;

use tandem_config::model::TandemConfig;
use tandem_core::TandemError;
use tandem_engine::Engine;
use tandem_gateway::{server, GatewayHub, Registry};
use tandem_storage::SqliteDirectory;
use tracing::info;

use crate::shutdown;

/// Run the `tandem serve` command.
pub async fn run_serve(config: TandemConfig) -> Result<(), TandemError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting tandem serve");
    if config.service.maintenance_mode {
        info!("maintenance mode is on: non-moderator traffic gets a canned notice");
    }

    let directory = Arc::new(SqliteDirectory::open(&config.storage).await?);
    let registry = Arc::new(Registry::new());
    let hub = Arc::new(GatewayHub::new(registry.clone(), directory.clone()));
    let engine = Arc::new(Engine::new(config.clone(), directory.clone(), hub));

    let listener = server::bind(&config.gateway).await?;
    let cancel = shutdown::install_signal_handler();

    server::serve(listener, engine, registry, cancel).await?;

    directory.close().await?;
    info!("tandem serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tandem={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
