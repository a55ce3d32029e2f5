// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server lifecycle: open storage, build state, serve until a shutdown signal.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;

use crate::api::router;
use crate::auth::{RateLimitSweeper, TokenError};
use crate::config::AppConfig;
use crate::shutdown;
use crate::state::AppState;
use crate::storage::{Database, StorageError};

/// In-flight requests get this long to finish after a shutdown signal.
pub const GRACE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid bind address: {0}")]
    Address(String),

    #[error("Failed to open database: {0}")]
    Database(#[from] StorageError),

    #[error("Invalid token configuration: {0}")]
    Token(#[from] TokenError),

    #[error("Failed to load TLS certificate or key: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Socket address from `HOST` and `PORT`. `HOST` must be an IP literal.
pub fn bind_addr(config: &AppConfig) -> Result<SocketAddr, ServerError> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|_| ServerError::Address(config.host.clone()))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Run the server until SIGINT/SIGTERM, then drain and stop the sweeper.
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    // Install the ring crypto provider for rustls before any TLS work
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let addr = bind_addr(&config)?;
    let tls = config.tls.clone();
    let environment = config.environment;

    let db = Database::open(&config.database_path)?;
    let state = AppState::new(config, db)?;

    let background = CancellationToken::new();
    let sweeper = tokio::spawn(
        RateLimitSweeper::new(state.rate_limiter.clone()).run(background.clone()),
    );

    let handle = Handle::<SocketAddr>::new();
    tokio::spawn({
        let handle = handle.clone();
        let background = background.clone();
        async move {
            if let Err(e) = shutdown::wait_for_signal().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            background.cancel();
            handle.graceful_shutdown(Some(GRACE_PERIOD));
        }
    });

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    let result = match tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(ServerError::Tls)?;
            tracing::info!(%addr, environment = environment.as_str(), "Listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app)
                .await
        }
        None => {
            tracing::info!(%addr, environment = environment.as_str(), "Listening on http (docs at /docs)");
            axum_server::bind(addr).handle(handle).serve(app).await
        }
    };

    background.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Rate limit sweeper did not stop cleanly");
    }
    tracing::info!("Server shutdown complete");

    result.map_err(ServerError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_accepts_ip_literals() {
        let mut config = AppConfig::for_tests("unused.redb");
        config.host = "0.0.0.0".to_string();
        config.port = 5000;
        assert_eq!(bind_addr(&config).unwrap().to_string(), "0.0.0.0:5000");

        config.host = "::1".to_string();
        assert_eq!(bind_addr(&config).unwrap().to_string(), "[::1]:5000");
    }

    #[test]
    fn bind_addr_rejects_hostnames() {
        let mut config = AppConfig::for_tests("unused.redb");
        config.host = "example.com".to_string();
        assert!(matches!(bind_addr(&config), Err(ServerError::Address(_))));
    }
}
