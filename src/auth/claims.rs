// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the caller identity attached to authenticated requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{Gender, StoredUser};

/// Claims embedded in an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user ID
    #[serde(rename = "userId")]
    pub user_id: u64,
    /// Subject email at issue time
    pub email: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// The user record resolved for the current request.
///
/// Loaded fresh from the user store on every authenticated request, so a
/// verification flag flipped in one request is visible in the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallerIdentity {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub gender: Gender,
    pub mobile_no: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub signup_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallerIdentity {
    /// Key used by the rate limiter for this caller.
    pub fn rate_limit_key(&self) -> String {
        format!("user:{}", self.id)
    }
}

impl From<StoredUser> for CallerIdentity {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            gender: user.gender,
            mobile_no: user.mobile_no,
            is_mobile_verified: user.is_mobile_verified,
            is_email_verified: user.is_email_verified,
            signup_type: user.signup_type,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The raw bearer token the caller presented, kept alongside the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);
