use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::admin::normalize_email;
use crate::entity::admin_user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAdmin;
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, LoginResponse, MeResponse, validate_login_request};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Handle admin login.
#[utoipa::path(
    post,
    path = "/api/v1/admin/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in as an admin",
    description = "Verifies the email address and password of an active admin and returns a bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong credentials or inactive account (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = normalize_email(&payload.email_address);
    let user = admin_user::Entity::find()
        .filter(admin_user::Column::EmailAddress.eq(&email))
        .one(&state.db)
        .await?
        .filter(|user| user.active)
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        &user.public_id,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let rehash = hash::needs_rehash(&user.password_hash);
    let user_id = user.id;
    let email_address = user.email_address.clone();

    let now = chrono::Utc::now();
    let mut active: admin_user::ActiveModel = user.into();
    active.last_login_at = Set(Some(now));
    if rehash {
        let upgraded = hash::hash_password(&payload.password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password_hash = Set(upgraded);
        active.updated_at = Set(now);
        tracing::info!(user_id, "Upgraded password hash parameters");
    }
    active.update(&state.db).await?;

    Ok(Json(LoginResponse {
        token,
        email_address,
    }))
}

/// Return the current authenticated admin.
#[utoipa::path(
    get,
    path = "/api/v1/admin/auth/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current admin",
    responses(
        (status = 200, description = "Authenticated admin", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_admin), fields(user_id = auth_admin.user_id))]
pub async fn me(auth_admin: AuthAdmin) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth_admin.user_id,
        email_address: auth_admin.email_address,
    })
}
