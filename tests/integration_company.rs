// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Company profile routes through the full router.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

async fn create_company(app: &TestApp, token: &str, name: &str) -> u64 {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/company",
            Some(token),
            Some(json!({
                "company_name": name,
                "industry": "Software",
                "website": "https://acme.example",
                "social_links": {"linkedin": "https://linkedin.com/company/acme"},
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["company"]["id"].as_u64().expect("company id")
}

#[tokio::test]
async fn owner_lifecycle() {
    let app = TestApp::new();
    let (owner_id, token) = app.register("a@x.com", "+15550001").await;
    let id = create_company(&app, &token, "Acme").await;

    let (status, body) = app
        .send(Method::GET, "/api/company/my-profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company"]["owner_id"], owner_id);
    assert_eq!(body["data"]["company"]["country"], "India");

    let (_, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(body["data"]["user"]["company"]["name"], "Acme");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/company/{id}"),
            Some(&token),
            Some(json!({"description": "<p>Robots</p>"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company"]["description"], "Robots");
    assert_eq!(body["data"]["company"]["company_name"], "Acme");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/company/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, &format!("/api/company/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Company not found");
}

#[tokio::test]
async fn second_profile_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("a@x.com", "+15550001").await;
    create_company(&app, &token, "Acme").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/company",
            Some(&token),
            Some(json!({"company_name": "Again"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You already have a company profile");
}

#[tokio::test]
async fn non_owner_is_forbidden_and_missing_is_not_found() {
    let app = TestApp::new();
    let (_, owner) = app.register("a@x.com", "+15550001").await;
    let (_, other) = app.register("b@x.com", "+15550002").await;
    let id = create_company(&app, &owner, "Acme").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/company/{id}"),
            Some(&other),
            Some(json!({"company_name": "Mine now"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to update this company");

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/company/{id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to delete this company");

    let (status, body) = app
        .send(Method::DELETE, "/api/company/9999", Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Company not found");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/company/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_reads_work_with_and_without_tokens() {
    let app = TestApp::new();
    let (_, token) = app.register("a@x.com", "+15550001").await;
    let id = create_company(&app, &token, "Acme Robotics").await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/company/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["company"]["owner_email"], "a@x.com");

    // A broken token on an optional route is ignored
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/company/{id}"),
            Some("garbage"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, "/api/company/search?q=ROBOT", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, body) = app.send(Method::GET, "/api/company/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (_, body) = app
        .send(Method::GET, "/api/company/industry/soft", None, None)
        .await;
    assert_eq!(body["data"]["count"], 1);

    let (status, body) = app
        .send(Method::GET, "/api/company?page=1&limit=500", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["totalPages"], 1);
    assert_eq!(body["data"]["companies"][0]["owner_name"], "Ada Lovelace");

    let (status, body) = app.send(Method::GET, "/api/company/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "Invalid ID parameter");
}

#[tokio::test]
async fn invalid_company_fields_are_listed() {
    let app = TestApp::new();
    let (_, token) = app.register("a@x.com", "+15550001").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/company",
            Some(&token),
            Some(json!({
                "company_name": "A",
                "founded_date": "yesterday",
                "social_links": {"facebook": "not a url"},
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Company name must be between 2 and 255 characters",
            "Please provide a valid date in YYYY-MM-DD format",
            "Facebook URL must be valid",
        ]
    );
}

#[tokio::test]
async fn comparison_signs_survive_sanitizing() {
    let app = TestApp::new();
    let (_, token) = app.register("a@x.com", "+15550001").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/company",
            Some(&token),
            Some(json!({
                "company_name": "Acme <Labs>",
                "description": "We grow 3x when churn < 2% per <b>month</b>",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(
        body["data"]["company"]["description"],
        "We grow 3x when churn < 2% per month"
    );
    assert_eq!(body["data"]["company"]["company_name"], "Acme");
}
