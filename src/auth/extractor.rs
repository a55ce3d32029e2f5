// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the caller identity.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller is CallerIdentity
//! }
//! ```
//!
//! When the route is already behind `require_auth` the identity is taken from
//! the request extensions; otherwise the extractor authenticates on its own.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{middleware::authenticate, AuthError, CallerIdentity};
use crate::state::AppState;

/// Extractor for authenticated callers.
pub struct Auth(pub CallerIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the caller
        if let Some(caller) = parts.extensions.get::<CallerIdentity>().cloned() {
            return Ok(Auth(caller));
        }

        let (caller, token) = authenticate(&parts.headers, state)?;
        parts.extensions.insert(caller.clone());
        parts.extensions.insert(token);
        Ok(Auth(caller))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid authentication is present, instead of rejecting.
/// Behind `optional_auth` the middleware's outcome is reused as is.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<CallerIdentity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<OptionalAuth>().cloned() {
            return Ok(resolved);
        }

        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(caller)) => Ok(OptionalAuth(Some(caller))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
