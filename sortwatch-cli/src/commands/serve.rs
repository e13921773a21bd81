// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sortwatch serve` command - Run the HTTP service.
//!
//! Builds the shared state once, starts the Prometheus exporter if one is
//! configured, and serves until Ctrl+C.

use std::net::SocketAddr;

use sortwatch_cli::{metrics, serve, AppState};
use sortwatch_core::ConfigLoader;

pub async fn execute(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(config = %config_path, "Starting sortwatch");

    // Fail fast on invalid config
    let config = ConfigLoader::load_file(config_path)?;
    let state = AppState::from_config(&config)?;

    let addr = SocketAddr::new(config.server.bind, config.server.port.value());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    SORTWATCH SERVICE                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  API:           http://{}", addr);
    if let Some(port) = config.server.prometheus_port {
        let metrics_addr = SocketAddr::new(config.server.bind, port.value());
        metrics::start_metrics_server(metrics_addr);
        println!("  Prometheus:    http://{}/metrics", metrics_addr);
    }
    println!(
        "  Request log:   {}",
        state.telemetry.request_log_path().display()
    );
    println!(
        "  Host log:      {}",
        state.telemetry.host_log_path().display()
    );
    println!();
    println!("Press Ctrl+C to stop");

    serve(addr, state, shutdown_signal())
        .await
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    println!("✓ Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
