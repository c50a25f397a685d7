use std::process::ExitCode;
use std::sync::Arc;

use api_mock::config::{ConfigManager, EnvConfigManager};
use api_mock::core::service::{MockService, Service};
use api_mock::middleware::logging::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration problems are reported before logging is set up
    let config_manager = match EnvConfigManager::load() {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            eprintln!("unable to load the configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = config_manager.get_config();

    init_tracing(&config.logging);
    config.log_configuration();

    let service = match MockService::new(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("unable to build the service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = service.start().await {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping the service");

    if let Err(e) = service.stop().await {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            futures::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                futures::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = futures::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
