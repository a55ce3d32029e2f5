// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `ToSchema` for OpenAPI documentation.
//!
//! Request bodies are deserialized leniently (missing fields default to
//! empty) so that the validators in `validation.rs` can report every problem
//! at once instead of failing on the first absent field.
//!
//! ## Model Categories
//!
//! - **Envelope**: the `{success, message, data}` wrapper on every success
//! - **Auth**: registration, login, verification and profile payloads
//! - **Company**: company profile create/update payloads and query params

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::storage::{Gender, StoredCompany, StoredUser};

// =============================================================================
// Response Envelope
// =============================================================================

/// Success envelope: `{ "success": true, "message": "...", "data": {...} }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

// =============================================================================
// Auth Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `m`, `f` or `o`
    pub gender: String,
    /// E.164 mobile number, e.g. `+919876543210`
    pub mobile_no: String,
    /// Identity provider UID, accepted but not required
    pub firebase_uid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyMobileRequest {
    pub mobile_no: String,
    /// 4-6 digit one-time code
    pub otp_code: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyEmailRequest {
    pub verification_token: Option<String>,
}

/// Profile fields a user may change. Email and password are ignored here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub mobile_no: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// =============================================================================
// Auth Responses
// =============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub gender: Gender,
    pub mobile_no: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
}

impl From<&StoredUser> for UserView {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            gender: user.gender,
            mobile_no: user.mobile_no.clone(),
            is_mobile_verified: user.is_mobile_verified,
            is_email_verified: user.is_email_verified,
        }
    }
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserView,
    pub token: String,
    /// Token lifetime, e.g. `"90 days"`
    #[serde(rename = "expiresIn")]
    pub expires_in: String,
}

/// Brief company reference embedded in the current-user view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyBrief {
    pub id: u64,
    pub name: String,
    pub logo_url: Option<String>,
}

impl From<&StoredCompany> for CompanyBrief {
    fn from(company: &StoredCompany) -> Self {
        Self {
            id: company.id,
            name: company.company_name.clone(),
            logo_url: company.logo_url.clone(),
        }
    }
}

/// Current user with their company, if any.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub gender: Gender,
    pub mobile_no: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
    pub signup_type: String,
    pub created_at: DateTime<Utc>,
    pub company: Option<CompanyBrief>,
}

impl CurrentUser {
    pub fn new(user: StoredUser, company: Option<&StoredCompany>) -> Self {
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
            company: company.map(CompanyBrief::from),
        }
    }
}

/// Verification status after a verify call.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerificationStatus {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub is_mobile_verified: bool,
    pub is_email_verified: bool,
}

impl From<&StoredUser> for VerificationStatus {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_mobile_verified: user.is_mobile_verified,
            is_email_verified: user.is_email_verified,
        }
    }
}

/// Profile after an update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredUser> for ProfileView {
    fn from(user: &StoredUser) -> Self {
        Self {
            user: UserView::from(user),
            updated_at: user.updated_at,
        }
    }
}

/// `{ "user": ... }`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserEnvelope<T> {
    pub user: T,
}

// =============================================================================
// Company Requests
// =============================================================================

/// Company profile payload, used for both create and update.
///
/// `social_links` stays untyped so a non-object value can be reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CompanyRequest {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub industry: Option<String>,
    pub organization_type: Option<String>,
    pub team_size: Option<String>,
    /// `YYYY-MM-DD`
    pub founded_date: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub social_links: Option<serde_json::Value>,
}

/// Query parameters for the company directory.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct PaginationQuery {
    /// Page number, starting at 1 (default 1)
    pub page: Option<String>,
    /// Page size (default 10, at most 100)
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct SearchQuery {
    /// Case-insensitive substring of the company name
    pub q: Option<String>,
}

// =============================================================================
// Company Responses
// =============================================================================

/// `{ "company": ... }`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyEnvelope<T> {
    pub company: T,
}

/// Search results.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyList {
    pub companies: Vec<StoredCompany>,
    pub count: usize,
}

impl From<Vec<StoredCompany>> for CompanyList {
    fn from(companies: Vec<StoredCompany>) -> Self {
        Self {
            count: companies.len(),
            companies,
        }
    }
}
