// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Identity tokens, the authentication gate, verification gates and the
//! request rate limiter.
//!
//! ## Auth Flow
//!
//! 1. Register or login returns an HS256 identity token (`userId`, `email`)
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. The server:
//!    - Verifies the signature and expiry (no leeway)
//!    - Loads the user row for `userId` on every request
//!    - Attaches the resulting [`CallerIdentity`] to the request
//!
//! Mutating routes then run, in order: verification gate, rate limiter,
//! handler, ownership check.
//!
//! ## Security
//!
//! - Tokens are stateless; logout is a client-side discard
//! - There is no revocation list and no refresh endpoint
//! - Store failures during authentication are 500s, never 401s

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod ratelimit;
pub mod token;
pub mod verification;

pub use claims::{BearerToken, CallerIdentity, TokenClaims};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use middleware::{authenticate, optional_auth, require_auth};
pub use ratelimit::{
    rate_limit, RateLimitLayer, RateLimitPolicy, RateLimitSweeper, RateLimited, RateLimiter,
};
pub use token::{extract_from_header, TokenError, TokenService};
pub use verification::{enforce_verification, VerificationRequirement};
