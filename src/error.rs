// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-boundary error type.
//!
//! Every handler and middleware returns [`ApiError`] (directly or through a
//! `From` conversion below), so status codes and the JSON error body are
//! decided in one place:
//!
//! ```json
//! { "success": false, "message": "...", "code": "...", "details": {}, "errors": [], "retryAfter": 900 }
//! ```
//!
//! Internal faults are logged here and rendered with a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{AuthError, RateLimited};
use crate::storage::{OwnershipError, StorageError};
use crate::validation::{FieldError, ValidationErrors};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
    pub details: Option<serde_json::Value>,
    pub errors: Option<Vec<FieldError>>,
    pub retry_after: Option<u64>,
    /// Logged when the response is rendered; never sent to the client.
    internal: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
            errors: None,
            retry_after: None,
            internal: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// A 500 with a generic client message; `detail` is only logged.
    pub fn internal(detail: impl Into<String>) -> Self {
        let mut error = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        error.internal = Some(detail.into());
        error
    }

    /// A 400 carrying per-field validation messages.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let mut error = Self::bad_request("Validation error");
        error.errors = Some(errors);
        error
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(detail) = &self.internal {
            tracing::error!(status = %self.status, error = %detail, "{}", self.message);
        }

        let retry_after = self.retry_after;
        let body = Json(ErrorBody {
            success: false,
            message: self.message,
            code: self.code,
            details: self.details,
            errors: self.errors,
            retry_after,
        });

        let mut response = (self.status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = e.status_code();
        let code = e.error_code();
        let message = e.to_string();

        match e {
            AuthError::InternalError(detail) => {
                let mut error = ApiError::internal(detail);
                error.message = message;
                error
            }
            AuthError::AccountNotVerified {
                email_verified,
                mobile_verified,
            } => ApiError::new(status, message)
                .with_code(code)
                .with_details(serde_json::json!({
                    "email_verified": email_verified,
                    "mobile_verified": mobile_verified,
                })),
            _ => ApiError::new(status, message).with_code(code),
        }
    }
}

impl From<RateLimited> for ApiError {
    fn from(e: RateLimited) -> Self {
        let mut error = ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        );
        error.retry_after = Some(e.retry_after_secs);
        error
    }
}

impl From<OwnershipError> for ApiError {
    fn from(e: OwnershipError) -> Self {
        match e {
            OwnershipError::NotFound { .. } => ApiError::not_found(e.to_string()),
            OwnershipError::Forbidden { .. } => ApiError::forbidden(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UniqueViolation { .. } => ApiError::conflict("Resource already exists"),
            StorageError::NotFound(_) => ApiError::not_found("Resource not found"),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::validation(e.into_inner())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!(error = %e.body_text(), "Rejected request body");
        ApiError::bad_request("Invalid JSON body").with_details(serde_json::json!({
            "reason": e.body_text(),
        }))
    }
}
