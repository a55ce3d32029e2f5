// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{Auth, OptionalAuth},
    error::ApiError,
    models::{
        ApiResponse, CompanyEnvelope, CompanyList, CompanyRequest, PaginationQuery, SearchQuery,
    },
    state::AppState,
    storage::{CompanyPage, CompanyWithOwner, OwnershipCheck, StoredCompany},
    validation,
};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Unparseable or non-positive values fall back to the defaults.
fn page_bounds(query: &PaginationQuery) -> (u64, u64) {
    let parse = |raw: Option<&String>| {
        raw.and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v >= 1)
    };
    let page = parse(query.page.as_ref()).unwrap_or(DEFAULT_PAGE);
    let limit = parse(query.limit.as_ref())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

#[utoipa::path(
    post,
    path = "/api/company",
    request_body = CompanyRequest,
    tag = "Company",
    responses(
        (status = 201, body = ApiResponse<CompanyEnvelope<StoredCompany>>),
        (status = 400, description = "Validation error or profile already exists"),
        (status = 403, description = "Verification required"),
        (status = 429, description = "Too many requests")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_company(
    State(state): State<AppState>,
    Auth(caller): Auth,
    body: Result<Json<CompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CompanyEnvelope<StoredCompany>>>), ApiError> {
    let Json(request) = body?;
    let new_company = validation::validate_new_company(&request)?;
    let companies = state.db.companies();

    if companies.find_by_owner(caller.id)?.is_some() {
        return Err(ApiError::bad_request("You already have a company profile"));
    }

    let company = companies.create(caller.id, new_company)?;
    tracing::info!(user_id = caller.id, company_id = company.id, "Company profile created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Company profile created successfully",
            CompanyEnvelope { company },
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/company/my-profile",
    tag = "Company",
    responses(
        (status = 200, body = ApiResponse<CompanyEnvelope<StoredCompany>>),
        (status = 404, description = "Company profile not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_company(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<ApiResponse<CompanyEnvelope<StoredCompany>>>, ApiError> {
    let company = state
        .db
        .companies()
        .find_by_owner(caller.id)?
        .ok_or_else(|| ApiError::not_found("Company profile not found"))?;

    Ok(Json(ApiResponse::data(CompanyEnvelope { company })))
}

#[utoipa::path(
    get,
    path = "/api/company/search",
    params(SearchQuery),
    tag = "Company",
    responses(
        (status = 200, body = ApiResponse<CompanyList>),
        (status = 400, description = "Search query is required")
    )
)]
pub async fn search_companies(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<CompanyList>>, ApiError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let companies = state.db.companies().find_by_name(term)?;
    tracing::debug!(
        viewer = ?viewer.map(|v| v.id),
        results = companies.len(),
        "Company search"
    );
    Ok(Json(ApiResponse::data(CompanyList::from(companies))))
}

#[utoipa::path(
    get,
    path = "/api/company/industry/{industry}",
    params(("industry" = String, Path, description = "Industry substring, case-insensitive")),
    tag = "Company",
    responses((status = 200, body = ApiResponse<CompanyList>))
)]
pub async fn companies_by_industry(
    State(state): State<AppState>,
    Path(industry): Path<String>,
) -> Result<Json<ApiResponse<CompanyList>>, ApiError> {
    let companies = state.db.companies().find_by_industry(industry.trim())?;
    Ok(Json(ApiResponse::data(CompanyList::from(companies))))
}

#[utoipa::path(
    get,
    path = "/api/company/{id}",
    params(("id" = u64, Path, description = "Company id")),
    tag = "Company",
    responses(
        (status = 200, body = ApiResponse<CompanyEnvelope<CompanyWithOwner>>),
        (status = 400, description = "Invalid ID parameter"),
        (status = 404, description = "Company not found")
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CompanyEnvelope<CompanyWithOwner>>>, ApiError> {
    let id = validation::parse_id(&id)?;
    let company = state
        .db
        .companies()
        .find_with_owner(id)?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(ApiResponse::data(CompanyEnvelope { company })))
}

#[utoipa::path(
    put,
    path = "/api/company/{id}",
    params(("id" = u64, Path, description = "Company id")),
    request_body = CompanyRequest,
    tag = "Company",
    responses(
        (status = 200, body = ApiResponse<CompanyEnvelope<StoredCompany>>),
        (status = 400, description = "Validation error or nothing to update"),
        (status = 403, description = "Caller does not own the company"),
        (status = 404, description = "Company not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_company(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<String>,
    body: Result<Json<CompanyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CompanyEnvelope<StoredCompany>>>, ApiError> {
    let id = validation::parse_id(&id)?;
    let Json(request) = body?;
    let changes = validation::validate_company_changes(&request)?;

    let companies = state.db.companies();
    companies.find_by_id(id)?.verify_owner(&caller, "update")?;

    if changes.is_empty() {
        return Err(ApiError::bad_request("No valid fields to update"));
    }

    let company = companies.update(id, changes)?;
    tracing::info!(user_id = caller.id, company_id = id, "Company profile updated");

    Ok(Json(ApiResponse::with_message(
        "Company profile updated successfully",
        CompanyEnvelope { company },
    )))
}

#[utoipa::path(
    delete,
    path = "/api/company/{id}",
    params(("id" = u64, Path, description = "Company id")),
    tag = "Company",
    responses(
        (status = 200, description = "Company profile deleted"),
        (status = 403, description = "Caller does not own the company"),
        (status = 404, description = "Company not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::parse_id(&id)?;
    let companies = state.db.companies();
    companies.find_by_id(id)?.verify_owner(&caller, "delete")?;

    if !companies.delete(id)? {
        return Err(ApiError::not_found("Company not found"));
    }
    tracing::info!(user_id = caller.id, company_id = id, "Company profile deleted");

    Ok(Json(ApiResponse::message("Company profile deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/company",
    params(PaginationQuery),
    tag = "Company",
    responses((status = 200, body = ApiResponse<CompanyPage>))
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<CompanyPage>>, ApiError> {
    let (page, limit) = page_bounds(&query);
    let result = state.db.companies().list(page, limit)?;
    Ok(Json(ApiResponse::data(result)))
}
