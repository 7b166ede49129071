use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::*;

use crate::entity::admin_user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated admin extracted from the `Authorization: Bearer <token>` header.
///
/// The token subject must still name an active admin, so deactivating an
/// account or rotating its public ID revokes outstanding tokens.
pub struct AuthAdmin {
    pub user_id: i32,
    pub email_address: String,
}

impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let user = admin_user::Entity::find()
            .filter(admin_user::Column::PublicId.eq(&claims.sub))
            .filter(admin_user::Column::Active.eq(true))
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthAdmin {
            user_id: user.id,
            email_address: user.email_address,
        })
    }
}
