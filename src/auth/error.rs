// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and verification-gate errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::token::TokenError;
use crate::error::ApiError;

/// Authentication error type.
///
/// Produced by the authentication gate and the verification gates; rendered
/// through [`ApiError`] like every other error at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization: Bearer <token>` header
    MissingToken,
    /// Token expiry has passed
    TokenExpired,
    /// Token is malformed or its signature does not match
    InvalidToken,
    /// Any other token decode failure
    VerificationFailed,
    /// Token subject no longer exists
    UserNotFound,
    /// A gate ran without an attached identity
    AuthenticationRequired,
    /// Route requires a verified email address
    EmailNotVerified,
    /// Route requires a verified mobile number
    MobileNotVerified,
    /// Route requires both verifications
    AccountNotVerified {
        email_verified: bool,
        mobile_verified: bool,
    },
    /// Unexpected fault while authenticating (e.g. store unreachable)
    InternalError(String),
}

impl AuthError {
    /// Machine-readable reason code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "NO_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::VerificationFailed => "TOKEN_VERIFICATION_FAILED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::MobileNotVerified => "MOBILE_NOT_VERIFIED",
            AuthError::AccountNotVerified { .. } => "ACCOUNT_NOT_VERIFIED",
            AuthError::InternalError(_) => "AUTHENTICATION_FAILED",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::VerificationFailed
            | AuthError::UserNotFound
            | AuthError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotVerified
            | AuthError::MobileNotVerified
            | AuthError::AccountNotVerified { .. } => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Access denied. No token provided."),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::VerificationFailed => write!(f, "Token verification failed"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::AuthenticationRequired => write!(f, "Authentication required"),
            AuthError::EmailNotVerified => write!(f, "Email verification required"),
            AuthError::MobileNotVerified => write!(f, "Mobile verification required"),
            AuthError::AccountNotVerified { .. } => write!(f, "Account verification required"),
            AuthError::InternalError(_) => write!(f, "Authentication failed"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::VerificationFailed => AuthError::VerificationFailed,
            TokenError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
