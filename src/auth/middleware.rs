// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate middleware for Axum.
//!
//! Resolves the bearer token to a freshly loaded [`CallerIdentity`] and
//! inserts it (with the raw [`BearerToken`]) into the request extensions,
//! where the verification gates, the rate limiter and the extractors in
//! `extractor.rs` pick it up.
//!
//! ```rust,ignore
//! get(handler).route_layer(axum::middleware::from_fn_with_state(
//!     state.clone(),
//!     require_auth,
//! ))
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{extract_from_header, AuthError, BearerToken, CallerIdentity, OptionalAuth};
use crate::state::AppState;

/// Resolve the request's bearer token to a caller identity.
///
/// The user row is read on every call, never cached, so verification flags
/// changed by a previous request are already visible.
pub fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<(CallerIdentity, BearerToken), AuthError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = extract_from_header(header).ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify(token)?;

    let user = state
        .db
        .users()
        .find_by_id(claims.user_id)
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .ok_or(AuthError::UserNotFound)?;

    Ok((CallerIdentity::from(user), BearerToken(token.to_string())))
}

/// Mandatory authentication: rejects the request unless a valid token for an
/// existing user is presented.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state) {
        Ok((caller, token)) => {
            tracing::Span::current().record("user_id", caller.id);
            request.extensions_mut().insert(caller);
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "Authentication rejected");
            e.into_response()
        }
    }
}

/// Optional authentication: attaches an identity when a valid token is
/// present and otherwise continues anonymously. Never rejects.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = match authenticate(request.headers(), &state) {
        Ok((caller, token)) => {
            tracing::Span::current().record("user_id", caller.id);
            request.extensions_mut().insert(caller.clone());
            request.extensions_mut().insert(token);
            Some(caller)
        }
        Err(AuthError::MissingToken) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Optional authentication skipped");
            None
        }
    };
    request.extensions_mut().insert(OptionalAuth(viewer));
    next.run(request).await
}
