// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;

use company_portal_server::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        // Logging is not initialized yet
        eprintln!("Configuration error: {e}");
        process::exit(1);
    });

    telemetry::init_tracing(config.log_format);

    if let Err(e) = server::run(config).await {
        tracing::error!(error = %e, "Server failed");
        process::exit(1);
    }
}
