//! Sideload Server: receive an artifact over the LAN and hand it to the host.
//!
//! Main entry point that wires the crates together and runs the upload
//! server until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::Path;
use std::process::Stdio;

use tracing_subscriber::{EnvFilter, fmt};

use sideload_api::UploadServer;
use sideload_core::config::{AppConfig, HookConfig};
use sideload_core::error::AppError;
use sideload_core::traits::{Notifier, ResourceHold, notifier};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("SIDELOAD_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    let env = std::env::var("SIDELOAD_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Sideload v{}", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let hold = sideload_power::from_config(&config.power);
    tracing::info!("Resource hold provider: {}", hold.name());

    let artifact_hook = host_notifier(config.hook.clone());
    let server = UploadServer::new(config, hold);

    let addr = server
        .start(port, artifact_hook)
        .await
        .map_err(|e| AppError::internal(format!("Failed to start upload server: {}", e)))?;
    tracing::info!("{}", browse_hint(addr));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    server.stop().await;

    tracing::info!("Sideload server shut down gracefully");
    Ok(())
}

/// Tell the operator where other devices should point their browser.
///
/// A wildcard bind has no single address to show, so only the port is
/// given.
fn browse_hint(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!(
            "Listening on all interfaces; open http://<this machine's LAN address>:{} from another device",
            addr.port()
        )
    } else {
        format!("Listening on {addr}; open http://{addr} from another device")
    }
}

/// Build the notifier that hands each artifact to the host.
fn host_notifier(hook: HookConfig) -> Notifier {
    notifier(move |path: &Path| {
        tracing::info!(path = %path.display(), "Artifact ready");
        if let Some(command) = hook.command.as_deref() {
            spawn_hook(command, path);
        }
    })
}

/// Run the configured hook without blocking the request.
fn spawn_hook(command: &str, artifact: &Path) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        tracing::warn!("Artifact hook command is empty, skipping");
        return;
    };

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(parts).arg(artifact).stdin(Stdio::null());

    let program = program.to_string();
    match cmd.spawn() {
        Ok(mut child) => {
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => {
                        tracing::info!(hook = %program, "Artifact hook finished");
                    }
                    Ok(status) => {
                        tracing::warn!(hook = %program, %status, "Artifact hook failed");
                    }
                    Err(e) => tracing::warn!(hook = %program, "Artifact hook wait error: {}", e),
                }
            });
        }
        Err(e) => tracing::error!(hook = %program, "Failed to run artifact hook: {}", e),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
