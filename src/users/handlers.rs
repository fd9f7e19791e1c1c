use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{AdminUserUpdate, UserResponse},
    repo_types::User,
};
use crate::{
    auth::extractors::AdminUser,
    error::{ApiError, ApiResult},
    state::AppState,
    validation::ValidJson,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", put(set_admin))
        .route("/admin/users/:id/reset-cards", post(reset_cards))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, admin))]
pub async fn set_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<AdminUserUpdate>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::set_admin(&state.db, id, body.is_admin)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(admin_id = %admin.id, user_id = %id, is_admin = body.is_admin, "admin flag changed");
    Ok(Json(user.into()))
}

#[instrument(skip(state, admin))]
pub async fn reset_cards(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::reset_found_cards(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(admin_id = %admin.id, user_id = %id, "found cards reset");
    Ok(Json(user.into()))
}
