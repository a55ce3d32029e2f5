// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! parsed [`AppConfig`] used throughout the application. Configuration is
//! loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `APP_ENV` | `development` or `production` | `development` |
//! | `DATABASE_PATH` | redb database file | `./data/company_portal.redb` |
//! | `JWT_SECRET` | HMAC secret for identity tokens | Required outside development |
//! | `JWT_EXPIRES_DAYS` | Token lifetime in days | `90` |
//! | `CORS_ORIGINS` | Comma separated allowed origins | local dev servers |
//! | `RATE_LIMIT_MAX_REQUESTS` | Authenticated mutations per window | `100` |
//! | `RATE_LIMIT_WINDOW_SECS` | Window for authenticated mutations | `900` |
//! | `AUTH_RATE_LIMIT_MAX` | Register/login attempts per window | `20` |
//! | `AUTH_RATE_LIMIT_WINDOW_SECS` | Window for register/login | `900` |
//! | `COMPANY_MUTATION_VERIFICATION` | `none`, `email`, `mobile` or `full` | `none` |
//! | `FIREBASE_PROJECT_ID` | Identity provider project (optional) | unset |
//! | `CLOUDINARY_CLOUD_NAME` | Media host account (optional) | unset |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files for HTTPS | unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{RateLimitPolicy, VerificationRequirement};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRES_DAYS_ENV: &str = "JWT_EXPIRES_DAYS";
pub const CORS_ORIGINS_ENV: &str = "CORS_ORIGINS";
pub const RATE_LIMIT_MAX_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const RATE_LIMIT_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
pub const AUTH_RATE_LIMIT_MAX_ENV: &str = "AUTH_RATE_LIMIT_MAX";
pub const AUTH_RATE_LIMIT_WINDOW_ENV: &str = "AUTH_RATE_LIMIT_WINDOW_SECS";
pub const COMPANY_VERIFICATION_ENV: &str = "COMPANY_MUTATION_VERIFICATION";
pub const FIREBASE_PROJECT_ENV: &str = "FIREBASE_PROJECT_ID";
pub const CLOUDINARY_CLOUD_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_PATH: &str = "./data/company_portal.redb";
const DEFAULT_JWT_EXPIRES_DAYS: i64 = 90;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:3000",
];

/// Secret used only when `APP_ENV=development` and `JWT_SECRET` is unset.
const DEVELOPMENT_JWT_SECRET: &str = "development-only-jwt-secret";

/// Configuration errors are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Optional third-party integrations. Each one is "configured" when its
/// primary identifier is present and otherwise reported as disabled.
#[derive(Debug, Clone, Default)]
pub struct IntegrationConfig {
    pub firebase_project_id: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
}

impl IntegrationConfig {
    pub fn firebase_enabled(&self) -> bool {
        self.firebase_project_id.is_some()
    }

    pub fn cloudinary_enabled(&self) -> bool {
        self.cloudinary_cloud_name.is_some()
    }
}

/// TLS certificate and key locations.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Fully parsed application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expires_days: i64,
    pub cors_origins: Vec<String>,
    pub mutation_rate_limit: RateLimitPolicy,
    pub auth_rate_limit: RateLimitPolicy,
    pub company_verification: VerificationRequirement,
    pub integrations: IntegrationConfig,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match get(APP_ENV_ENV).as_deref() {
            None | Some("development") | Some("dev") | Some("test") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: APP_ENV_ENV,
                    value: other.to_string(),
                })
            }
        };

        let jwt_secret = match get(JWT_SECRET_ENV) {
            Some(secret) => secret,
            None if environment == Environment::Development => DEVELOPMENT_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing(JWT_SECRET_ENV)),
        };

        let jwt_expires_days = parse_or(&get, JWT_EXPIRES_DAYS_ENV, DEFAULT_JWT_EXPIRES_DAYS)?;
        if jwt_expires_days <= 0 {
            return Err(ConfigError::Invalid {
                name: JWT_EXPIRES_DAYS_ENV,
                value: jwt_expires_days.to_string(),
            });
        }

        let cors_origins = match get(CORS_ORIGINS_ENV) {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let mutation_rate_limit = RateLimitPolicy::new(
            parse_or(&get, RATE_LIMIT_MAX_ENV, RateLimitPolicy::DEFAULT_MAX_REQUESTS)?,
            Duration::from_secs(parse_or(
                &get,
                RATE_LIMIT_WINDOW_ENV,
                RateLimitPolicy::DEFAULT_WINDOW.as_secs(),
            )?),
        );
        let auth_rate_limit = RateLimitPolicy::new(
            parse_or(&get, AUTH_RATE_LIMIT_MAX_ENV, 20)?,
            Duration::from_secs(parse_or(&get, AUTH_RATE_LIMIT_WINDOW_ENV, 900)?),
        );

        let company_verification = match get(COMPANY_VERIFICATION_ENV) {
            None => VerificationRequirement::None,
            Some(raw) => {
                VerificationRequirement::parse(&raw).ok_or(ConfigError::Invalid {
                    name: COMPANY_VERIFICATION_ENV,
                    value: raw,
                })?
            }
        };

        let tls = match (get(TLS_CERT_ENV), get(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, PORT_ENV, DEFAULT_PORT)?,
            environment,
            database_path: get(DATABASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            jwt_secret,
            jwt_expires_days,
            cors_origins,
            mutation_rate_limit,
            auth_rate_limit,
            company_verification,
            integrations: IntegrationConfig {
                firebase_project_id: get(FIREBASE_PROJECT_ENV),
                cloudinary_cloud_name: get(CLOUDINARY_CLOUD_ENV),
            },
            tls,
            log_format,
        })
    }

    /// Configuration suitable for tests: development mode, fixed secret.
    pub fn for_tests(database_path: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            database_path: database_path.into(),
            jwt_secret: "test-secret".to_string(),
            jwt_expires_days: DEFAULT_JWT_EXPIRES_DAYS,
            cors_origins: Vec::new(),
            mutation_rate_limit: RateLimitPolicy::default(),
            auth_rate_limit: RateLimitPolicy::new(20, Duration::from_secs(900)),
            company_verification: VerificationRequirement::None,
            integrations: IntegrationConfig::default(),
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_in_development() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.jwt_expires_days, 90);
        assert_eq!(config.mutation_rate_limit.max_requests, 100);
        assert_eq!(config.mutation_rate_limit.window, Duration::from_secs(900));
        assert_eq!(config.company_verification, VerificationRequirement::None);
        assert!(config.tls.is_none());
        assert!(!config.integrations.firebase_enabled());
        assert_eq!(config.cors_origins.len(), DEFAULT_CORS_ORIGINS.len());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let result = load(&[("APP_ENV", "production")]);
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        let config = load(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = load(&[("PORT", "not-a-port")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));

        let result = load(&[("JWT_EXPIRES_DAYS", "0")]);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[("CORS_ORIGINS", "https://a.example, https://b.example,")]).unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn verification_requirement_is_parsed() {
        let config = load(&[("COMPANY_MUTATION_VERIFICATION", "full")]).unwrap();
        assert_eq!(config.company_verification, VerificationRequirement::Full);

        let result = load(&[("COMPANY_MUTATION_VERIFICATION", "sometimes")]);
        assert!(result.is_err());
    }

    #[test]
    fn tls_requires_both_paths() {
        let result = load(&[("TLS_CERT_PATH", "/tmp/cert.pem")]);
        assert!(matches!(result, Err(ConfigError::Missing("TLS_KEY_PATH"))));
    }

    #[test]
    fn integrations_enable_when_configured() {
        let config = load(&[("CLOUDINARY_CLOUD_NAME", "demo")]).unwrap();
        assert!(config.integrations.cloudinary_enabled());
        assert!(!config.integrations.firebase_enabled());
    }
}
