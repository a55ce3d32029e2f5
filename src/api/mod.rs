// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! Gates are attached per method with `route_layer`, innermost first, so a
//! gated mutation runs: authentication, verification, rate limit, handler.
//! Credential routes are rate limited by peer address before any identity
//! exists.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post, put, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        enforce_verification, optional_auth, rate_limit, require_auth, RateLimitLayer,
        VerificationRequirement,
    },
    error::ApiError,
    models::{
        AuthPayload, ChangePasswordRequest, CompanyBrief, CompanyList, CompanyRequest,
        CurrentUser, LoginRequest, ProfileView, RegisterRequest, UpdateProfileRequest, UserView,
        VerificationStatus, VerifyEmailRequest, VerifyMobileRequest,
    },
    state::AppState,
    storage::{CompanyPage, CompanySummary, CompanyWithOwner, Gender, StoredCompany},
    validation::FieldError,
};

pub mod auth;
pub mod company;
pub mod health;

/// Route gates shared by every route group.
#[derive(Clone)]
struct Gates {
    state: AppState,
    credential_limit: RateLimitLayer,
    mutation_limit: RateLimitLayer,
    company_verification: VerificationRequirement,
}

impl Gates {
    fn new(state: &AppState) -> Self {
        let config = &state.config;
        Self {
            state: state.clone(),
            credential_limit: RateLimitLayer::new(
                state.rate_limiter.clone(),
                config.auth_rate_limit,
            ),
            mutation_limit: RateLimitLayer::new(
                state.rate_limiter.clone(),
                config.mutation_rate_limit,
            ),
            company_verification: config.company_verification,
        }
    }

    /// Credential routes: rate limited per peer address.
    fn credential(&self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        route.route_layer(from_fn_with_state(self.credential_limit.clone(), rate_limit))
    }

    /// Authentication only.
    fn authenticated(&self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        route.route_layer(from_fn_with_state(self.state.clone(), require_auth))
    }

    /// Authenticated and rate limited per caller.
    fn mutation(&self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        self.authenticated(
            route.route_layer(from_fn_with_state(self.mutation_limit.clone(), rate_limit)),
        )
    }

    /// Authenticated, verified per the company policy, rate limited per caller.
    fn company_mutation(&self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        let route = route
            .route_layer(from_fn_with_state(self.mutation_limit.clone(), rate_limit))
            .route_layer(from_fn_with_state(
                self.company_verification,
                enforce_verification,
            ));
        self.authenticated(route)
    }

    /// Identity attached when present, never rejected.
    fn public(&self, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
        route.route_layer(from_fn_with_state(self.state.clone(), optional_auth))
    }
}

fn auth_routes(gates: &Gates) -> Router<AppState> {
    Router::new()
        .route("/register", gates.credential(post(auth::register)))
        .route("/login", gates.credential(post(auth::login)))
        .route("/me", gates.authenticated(get(auth::me)))
        .route("/verify-mobile", gates.mutation(post(auth::verify_mobile)))
        .route("/verify-email", gates.mutation(post(auth::verify_email)))
        .route("/profile", gates.mutation(put(auth::update_profile)))
        .route(
            "/change-password",
            gates.mutation(post(auth::change_password)),
        )
        .route("/logout", gates.authenticated(post(auth::logout)))
}

fn company_routes(gates: &Gates) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            gates
                .public(get(company::list_companies))
                .merge(gates.company_mutation(post(company::create_company))),
        )
        .route("/my-profile", gates.authenticated(get(company::my_company)))
        .route("/search", gates.public(get(company::search_companies)))
        .route(
            "/industry/{industry}",
            gates.public(get(company::companies_by_industry)),
        )
        .route(
            "/{id}",
            gates.public(get(company::get_company)).merge(
                gates.company_mutation(
                    put(company::update_company).delete(company::delete_company),
                ),
            ),
        )
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    let gates = Gates::new(&state);
    let cors = cors_layer(&state.config.cors_origins);

    let api = Router::new()
        .nest("/api/auth", auth_routes(&gates))
        .nest("/api/company", company_routes(&gates))
        .route("/api/health", get(health::health))
        .fallback(route_not_found)
        .with_state(state);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id,
            user_id = tracing::field::Empty,
        )
    });

    api.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::me,
        auth::verify_mobile,
        auth::verify_email,
        auth::update_profile,
        auth::change_password,
        auth::logout,
        company::create_company,
        company::my_company,
        company::search_companies,
        company::companies_by_industry,
        company::get_company,
        company::update_company,
        company::delete_company,
        company::list_companies,
        health::health
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            VerifyMobileRequest,
            VerifyEmailRequest,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CompanyRequest,
            UserView,
            AuthPayload,
            CurrentUser,
            CompanyBrief,
            VerificationStatus,
            ProfileView,
            CompanyList,
            StoredCompany,
            CompanyWithOwner,
            CompanySummary,
            CompanyPage,
            Gender,
            FieldError,
            health::HealthResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration, login and account verification"),
        (name = "Company", description = "Company profile directory"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;
