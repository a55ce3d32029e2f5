// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{RateLimiter, TokenError, TokenService};
use crate::config::AppConfig;
use crate::storage::Database;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the state from parsed configuration and an opened database.
    ///
    /// # Errors
    /// Fails when the token signing configuration is unusable.
    pub fn new(config: AppConfig, db: Database) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expires_days)?;
        Ok(Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            rate_limiter: Arc::new(RateLimiter::new()),
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// State backed by a fresh database in a temporary directory.
    pub fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("portal.redb");
        let db = Database::open(&path).expect("Failed to open database");
        let state = AppState::new(AppConfig::for_tests(path), db).expect("Failed to build state");
        (state, dir)
    }
}
