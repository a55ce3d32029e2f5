// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Company Portal Server - account and company profile service
//!
//! Users register with email and mobile number, authenticate with signed
//! bearer tokens, and manage a single company profile each. Profiles are
//! publicly browsable; only the owner may change or remove one.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, authentication gates, verification gates, rate limiting
//! - `storage` - Embedded redb store for users and companies, ownership checks
//! - `validation` - Request validation and HTML sanitization

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod validation;
