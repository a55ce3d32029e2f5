// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Database read probe.
    pub database: String,
    /// "configured" or "disabled".
    pub firebase: String,
    pub cloudinary: String,
}

fn integration_status(enabled: bool) -> String {
    if enabled { "configured" } else { "disabled" }.to_string()
}

/// Health check endpoint handler.
///
/// Returns 200 when the database answers, 503 otherwise. Disabled
/// integrations are reported but never degrade the status.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.db.ping() {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            "unavailable".to_string()
        }
    };

    let healthy = database == "ok";
    let integrations = &state.config.integrations;
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        environment: state.config.environment.as_str().to_string(),
        timestamp: Utc::now(),
        checks: HealthChecks {
            service: "ok".to_string(),
            database,
            firebase: integration_status(integrations.firebase_enabled()),
            cloudinary: integration_status(integrations.cloudinary_enabled()),
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn healthy_database_reports_ok() {
        let (state, _dir) = test_state();
        let (status, Json(body)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.environment, "development");
        assert_eq!(body.checks.database, "ok");
        assert_eq!(body.checks.firebase, "disabled");
        assert_eq!(body.checks.cloudinary, "disabled");
    }
}
