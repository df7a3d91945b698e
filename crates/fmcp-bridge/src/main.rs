//! # fmcp-bridge
//!
//! Bridge binary: loads settings, binds the plugin port and serves until
//! Ctrl-C. Configuration comes from `~/.fmcp/settings.json` and `FIGMA_*`
//! environment variables; there are no command-line flags.

#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use fmcp_connector::PluginBridgeConnector;
use fmcp_server::{BridgeServer, ServerConfig};
use fmcp_settings::{BridgeSettings, load_settings};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = load_settings().context("Failed to load settings")?;
    settings.validate().context("Invalid settings")?;
    fmcp_core::logging::init_subscriber(&settings.log_level);
    log_settings(&settings);

    let mut server = BridgeServer::new(ServerConfig::from_settings(&settings));
    if let Some(handle) = fmcp_server::metrics::install_recorder() {
        server = server.with_metrics(handle);
    }

    let addr = match server.start().await {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "failed to start plugin bridge");
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(
        "{} v{} listening on ws://{addr}",
        fmcp_core::constants::PRODUCT_NAME,
        fmcp_core::constants::VERSION
    );

    let connector = PluginBridgeConnector::new(server.transport());
    connector.initialize();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    connector.dispose();
    server.stop().await;
    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

fn log_settings(settings: &BridgeSettings) {
    tracing::info!(
        host = %settings.host,
        port = settings.port,
        policy = ?settings.port_policy,
        range_end = settings.port_range_end,
        audit = settings.audit_log_path.is_some(),
        "settings loaded"
    );
}
