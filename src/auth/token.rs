// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with the server secret. They are stateless
//! bearer credentials: the server never stores them, so logging out is purely
//! a client-side action.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::claims::TokenClaims;

/// Errors produced while issuing or verifying identity tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token verification failed")]
    VerificationFailed,

    #[error("Token generation failed: {0}")]
    Signing(String),
}

/// Issues and verifies signed identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in_days: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expires_in_days", &self.expires_in_days)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the shared secret.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the secret is empty or the lifetime is
    /// not positive. Both are startup misconfigurations.
    pub fn new(secret: &str, expires_in_days: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }
        if expires_in_days <= 0 {
            return Err(TokenError::Signing(format!(
                "token lifetime must be positive, got {expires_in_days} days"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in_days,
        })
    }

    /// Configured token lifetime in days.
    pub fn expires_in_days(&self) -> i64 {
        self.expires_in_days
    }

    /// Human readable lifetime, as returned to clients.
    pub fn expires_in_label(&self) -> String {
        format!("{} days", self.expires_in_days)
    }

    /// Issue a token for the given subject, valid from now.
    pub fn issue(&self, user_id: u64, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        user_id: u64,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at + Duration::days(self.expires_in_days);
        let claims = TokenClaims {
            user_id,
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "JWT generation failed");
            TokenError::Signing(e.to_string())
        })
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Invalid,
                _ => TokenError::VerificationFailed,
            })
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Only the exact two-part shape `Bearer <token>` is recognized. Any other
/// shape yields `None`, never an error.
pub fn extract_from_header(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", 90).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_original_claims() {
        let tokens = service();
        let token = tokens.issue(42, "a@x.com").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 90 * 86_400);
    }

    #[test]
    fn token_expires_after_configured_days() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::days(91);
        let token = tokens.issue_at(42, "a@x.com", issued_at).unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_is_valid_just_before_expiry() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::days(89);
        let token = tokens.issue_at(7, "b@x.com", issued_at).unwrap();

        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = TokenService::new("some-other-secret", 90).unwrap();
        let token = other.issue(1, "a@x.com").unwrap();

        assert_eq!(service().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let tokens = service();
        let token = tokens.issue(1, "a@x.com").unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = r#"{"userId":2,"email":"a@x.com","iat":0,"exp":9999999999}"#;
        parts[1] = URL_SAFE_NO_PAD.encode(forged.as_bytes());

        assert_eq!(tokens.verify(&parts.join(".")), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(service().verify("not-a-jwt"), Err(TokenError::Invalid));
        assert_eq!(service().verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenService::new("", 90),
            Err(TokenError::Signing(_))
        ));
        assert!(TokenService::new("secret", 0).is_err());
    }

    #[test]
    fn error_messages_match_client_contract() {
        assert_eq!(TokenError::Expired.to_string(), "Token has expired");
        assert_eq!(TokenError::Invalid.to_string(), "Invalid token");
        assert_eq!(
            TokenError::VerificationFailed.to_string(),
            "Token verification failed"
        );
    }

    #[test]
    fn extract_accepts_only_bearer_pairs() {
        assert_eq!(extract_from_header(Some("Bearer abc.def")), Some("abc.def"));

        assert_eq!(extract_from_header(None), None);
        assert_eq!(extract_from_header(Some("")), None);
        assert_eq!(extract_from_header(Some("Token xyz")), None);
        assert_eq!(extract_from_header(Some("Bearer")), None);
        assert_eq!(extract_from_header(Some("Bearer a b")), None);
        assert_eq!(extract_from_header(Some("bearer xyz")), None);
        assert_eq!(extract_from_header(Some("Bearer ")), None);
    }
}
