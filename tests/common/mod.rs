// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Common helpers for router-level integration tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use company_portal_server::api::router;
use company_portal_server::config::AppConfig;
use company_portal_server::state::AppState;
use company_portal_server::storage::Database;

/// Test application with its backing temp directory.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build an app after adjusting the test configuration.
    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("portal.redb");
        let mut config = AppConfig::for_tests(path.clone());
        adjust(&mut config);

        let db = Database::open(&path).expect("Failed to open database");
        let state = AppState::new(config, db).expect("Failed to build state");
        Self {
            router: router(state.clone()),
            state,
            _dir: dir,
        }
    }

    /// Send one request; returns status and parsed JSON body (Null if empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Register a user and return (user id, token).
    pub async fn register(&self, email: &str, mobile: &str) -> (u64, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(register_body(email, mobile)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = body["data"]["user"]["id"].as_u64().expect("user id");
        let token = body["data"]["token"].as_str().expect("token").to_string();
        (id, token)
    }
}

pub fn register_body(email: &str, mobile: &str) -> Value {
    json!({
        "email": email,
        "password": "Passw0rd!",
        "full_name": "Ada Lovelace",
        "gender": "f",
        "mobile_no": mobile,
    })
}
