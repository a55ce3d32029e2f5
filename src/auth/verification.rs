// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification gates.
//!
//! A gate runs after authentication and rejects callers whose account has not
//! completed the required verification step.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{AuthError, CallerIdentity};

/// Which verification a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationRequirement {
    /// No verification; any authenticated caller passes
    #[default]
    None,
    /// Verified email address
    Email,
    /// Verified mobile number
    Mobile,
    /// Both email and mobile verified
    Full,
}

impl VerificationRequirement {
    /// Parse from a configuration value (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "email" => Some(Self::Email),
            "mobile" => Some(Self::Mobile),
            "full" | "both" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Email => "email",
            Self::Mobile => "mobile",
            Self::Full => "full",
        }
    }

    /// Check the caller against this requirement.
    pub fn check(&self, caller: &CallerIdentity) -> Result<(), AuthError> {
        match self {
            Self::None => Ok(()),
            Self::Email if !caller.is_email_verified => Err(AuthError::EmailNotVerified),
            Self::Mobile if !caller.is_mobile_verified => Err(AuthError::MobileNotVerified),
            Self::Full if !(caller.is_email_verified && caller.is_mobile_verified) => {
                Err(AuthError::AccountNotVerified {
                    email_verified: caller.is_email_verified,
                    mobile_verified: caller.is_mobile_verified,
                })
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for VerificationRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification gate middleware.
///
/// Must be layered inside an authentication gate; without an attached
/// identity the request is rejected with `AuthenticationRequired`.
///
/// ```rust,ignore
/// put(handler).route_layer(axum::middleware::from_fn_with_state(
///     VerificationRequirement::Email,
///     enforce_verification,
/// ))
/// ```
pub async fn enforce_verification(
    State(requirement): State<VerificationRequirement>,
    request: Request,
    next: Next,
) -> Response {
    let Some(caller) = request.extensions().get::<CallerIdentity>() else {
        return AuthError::AuthenticationRequired.into_response();
    };

    if let Err(e) = requirement.check(caller) {
        tracing::info!(
            user_id = caller.id,
            requirement = %requirement,
            "Verification gate rejected request"
        );
        return e.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Gender;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use chrono::Utc;
    use tower::ServiceExt;

    fn caller(email: bool, mobile: bool) -> CallerIdentity {
        let now = Utc::now();
        CallerIdentity {
            id: 1,
            email: "a@x.com".to_string(),
            full_name: "Ada".to_string(),
            gender: Gender::Female,
            mobile_no: "+15550001".to_string(),
            is_mobile_verified: mobile,
            is_email_verified: email,
            signup_type: "e".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn email_gate() {
        let gate = VerificationRequirement::Email;
        assert!(gate.check(&caller(true, false)).is_ok());
        assert_eq!(
            gate.check(&caller(false, true)),
            Err(AuthError::EmailNotVerified)
        );
    }

    #[test]
    fn mobile_gate() {
        let gate = VerificationRequirement::Mobile;
        assert!(gate.check(&caller(false, true)).is_ok());
        assert_eq!(
            gate.check(&caller(true, false)),
            Err(AuthError::MobileNotVerified)
        );
    }

    #[test]
    fn full_gate_reports_both_flags() {
        let gate = VerificationRequirement::Full;
        assert!(gate.check(&caller(true, true)).is_ok());
        assert_eq!(
            gate.check(&caller(true, false)),
            Err(AuthError::AccountNotVerified {
                email_verified: true,
                mobile_verified: false
            })
        );
    }

    #[test]
    fn none_gate_passes_everyone() {
        assert!(VerificationRequirement::None
            .check(&caller(false, false))
            .is_ok());
    }

    #[test]
    fn parses_config_values() {
        assert_eq!(
            VerificationRequirement::parse("EMAIL"),
            Some(VerificationRequirement::Email)
        );
        assert_eq!(
            VerificationRequirement::parse("full"),
            Some(VerificationRequirement::Full)
        );
        assert_eq!(
            VerificationRequirement::parse(""),
            Some(VerificationRequirement::None)
        );
        assert_eq!(VerificationRequirement::parse("sms"), None);
    }

    fn gated(requirement: VerificationRequirement) -> Router {
        Router::new().route(
            "/",
            get(|| async { "ok" }).route_layer(axum::middleware::from_fn_with_state(
                requirement,
                enforce_verification,
            )),
        )
    }

    #[tokio::test]
    async fn gate_without_identity_is_unauthorized() {
        let response = gated(VerificationRequirement::Email)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn gate_rejects_unverified_identity() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(caller(false, true));

        let response = gated(VerificationRequirement::Email)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn gate_passes_verified_identity() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(caller(true, true));

        let response = gated(VerificationRequirement::Full)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
