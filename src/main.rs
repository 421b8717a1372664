// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use std::net::SocketAddr;
use std::process::ExitCode;

use sojo_news_server::{
    api::router,
    auth::{AuthGate, GoogleVerifier},
    config::{AppConfig, ConfigError},
    logging::init_tracing,
    providers::{CloudinaryClient, UploadError},
    state::AppState,
    storage::{FileStorage, StorageError, StoragePaths, UserRepository},
};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to initialize storage: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to configure image uploads: {0}")]
    Uploads(#[from] UploadError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The subscriber may not be installed yet.
            eprintln!("sojo-news-server: {e}");
            error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format).map_err(|e| StartupError::Logging(e.to_string()))?;

    let mut storage = FileStorage::new(StoragePaths::new(&config.data_dir));
    storage.initialize()?;

    if !config.admin_emails.is_empty() {
        let promoted = UserRepository::new(&storage).promote_admins(&config.admin_emails)?;
        if !promoted.is_empty() {
            info!(count = promoted.len(), "Promoted configured admin accounts");
        }
    }

    let mut state = AppState::new(storage, AuthGate::from_config(&config.auth))
        .with_admin_emails(config.admin_emails.clone())
        .with_auth_rate_limit(config.auth_rate_limit)
        .with_cors_allowed_origins(config.cors_allowed_origins.clone());
    if let Some(google) = &config.google {
        state = state.with_google(GoogleVerifier::new(google));
    }
    if let Some(cloudinary) = &config.cloudinary {
        state = state.with_assets(CloudinaryClient::new(cloudinary)?);
    }

    info!(
        data_dir = %config.data_dir.display(),
        token_ttl_secs = config.auth.token_ttl.as_secs(),
        cookie = config.auth.cookie_enabled,
        cookie_secure = config.auth.cookie_secure,
        google_sign_in = config.google.is_some(),
        image_uploads = config.cloudinary.is_some(),
        admin_emails = config.admin_emails.len(),
        auth_rate_limit = config.auth_rate_limit.max_requests,
        auth_rate_window_secs = config.auth_rate_limit.window.as_secs(),
        cors_origins = config.cors_allowed_origins.len(),
        "Configuration loaded"
    );

    let app = router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    info!(addr = %address, "Sojo News server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(StartupError::Serve)?;

    info!("Server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
