// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{
        ApiResponse, AuthPayload, ChangePasswordRequest, CurrentUser, LoginRequest, ProfileView,
        RegisterRequest, UpdateProfileRequest, UserEnvelope, UserView, VerificationStatus,
        VerifyEmailRequest, VerifyMobileRequest,
    },
    state::AppState,
    storage::{run_blocking, verify_password, StoredUser},
    validation,
};

fn auth_payload(state: &AppState, user: &StoredUser) -> Result<AuthPayload, ApiError> {
    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(AuthPayload {
        user: UserView::from(user),
        token,
        expires_in: state.tokens.expires_in_label(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, body = ApiResponse<AuthPayload>),
        (status = 400, description = "Validation error or email/mobile already registered"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>), ApiError> {
    let Json(request) = body?;
    let new_user = validation::validate_register(&request)?;
    let users = state.db.users();

    if users.find_by_email(&new_user.email)?.is_some() {
        return Err(ApiError::bad_request("User with this email already exists"));
    }
    if users.find_by_mobile(&new_user.mobile_no)?.is_some() {
        return Err(ApiError::bad_request(
            "User with this mobile number already exists",
        ));
    }

    let user = run_blocking(&state.db, move |db| db.users().create(new_user)).await?;
    tracing::info!(user_id = user.id, "User registered");

    let payload = auth_payload(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User registered successfully", payload)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = ApiResponse<AuthPayload>),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let Json(request) = body?;
    let email = validation::validate_login(&request)?;

    // Unknown email and wrong password are indistinguishable to the client
    let password = request.password;
    let user = run_blocking(&state.db, move |db| {
        Ok(db
            .users()
            .find_by_email(&email)?
            .filter(|user| verify_password(&password, &user.password_hash)))
    })
    .await?
    .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    tracing::info!(user_id = user.id, "User logged in");
    let payload = auth_payload(&state, &user)?;
    Ok(Json(ApiResponse::with_message("Login successful", payload)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, body = ApiResponse<UserEnvelope<CurrentUser>>),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<ApiResponse<UserEnvelope<CurrentUser>>>, ApiError> {
    let (user, company) = state
        .db
        .users()
        .find_with_company(caller.id)?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(ApiResponse::data(UserEnvelope {
        user: CurrentUser::new(user, company.as_ref()),
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-mobile",
    request_body = VerifyMobileRequest,
    tag = "Auth",
    responses(
        (status = 200, body = ApiResponse<UserEnvelope<VerificationStatus>>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_mobile(
    State(state): State<AppState>,
    Auth(caller): Auth,
    body: Result<Json<VerifyMobileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserEnvelope<VerificationStatus>>>, ApiError> {
    let Json(request) = body?;
    let mobile_no = validation::validate_mobile_verification(&request)?;

    // The one-time code is checked by the client-side SMS provider
    let user = state
        .db
        .users()
        .update_mobile_verification(caller.id, true)?;
    tracing::info!(user_id = user.id, %mobile_no, "Mobile number verified");

    Ok(Json(ApiResponse::with_message(
        "Mobile number verified successfully",
        UserEnvelope {
            user: VerificationStatus::from(&user),
        },
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body(content = VerifyEmailRequest, description = "Optional provider token"),
    tag = "Auth",
    responses(
        (status = 200, body = ApiResponse<UserEnvelope<VerificationStatus>>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Auth(caller): Auth,
    body: Result<Option<Json<VerifyEmailRequest>>, JsonRejection>,
) -> Result<Json<ApiResponse<UserEnvelope<VerificationStatus>>>, ApiError> {
    let request = body?.map(|Json(request)| request).unwrap_or_default();
    let user = state.db.users().update_email_verification(caller.id, true)?;
    tracing::info!(
        user_id = user.id,
        provider_token = request.verification_token.is_some(),
        "Email verified"
    );

    Ok(Json(ApiResponse::with_message(
        "Email verified successfully",
        UserEnvelope {
            user: VerificationStatus::from(&user),
        },
    )))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    tag = "Auth",
    responses(
        (status = 200, body = ApiResponse<UserEnvelope<ProfileView>>),
        (status = 400, description = "Validation error or nothing to update"),
        (status = 409, description = "Mobile number already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Auth(caller): Auth,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserEnvelope<ProfileView>>>, ApiError> {
    let Json(request) = body?;
    let changes = validation::validate_profile(&request)?;
    let user = state.db.users().update_profile(caller.id, changes)?;

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        UserEnvelope {
            user: ProfileView::from(&user),
        },
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    Auth(caller): Auth,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(request) = body?;
    validation::validate_password_change(&request)?;

    let user = state
        .db
        .users()
        .find_by_id(caller.id)?
        .ok_or(AuthError::UserNotFound)?;

    let user_id = user.id;
    let current_hash = user.password_hash;
    let ChangePasswordRequest {
        current_password,
        new_password,
    } = request;
    let changed = run_blocking(&state.db, move |db| {
        if !verify_password(&current_password, &current_hash) {
            return Ok(false);
        }
        db.users().update_password(user_id, &new_password)?;
        Ok(true)
    })
    .await?;
    if !changed {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }
    tracing::info!(user_id, "Password changed");
    Ok(Json(ApiResponse::message("Password changed successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout successful")),
    security(("bearer_auth" = []))
)]
pub async fn logout(Auth(caller): Auth) -> Json<ApiResponse<()>> {
    // Tokens are stateless; the client discards its copy
    tracing::info!(user_id = caller.id, "User logged out");
    Json(ApiResponse::message("Logout successful"))
}
