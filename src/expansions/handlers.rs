use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{ExpansionCreate, ExpansionUpdate};
use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::{ApiError, ApiResult},
    expansions::repo_types::Expansion,
    state::AppState,
    validation::ValidJson,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/expansions", get(list_expansions))
        .route("/expansions/:id", get(get_expansion))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/expansions", post(create_expansion))
        .route("/expansions/:id", put(update_expansion).delete(delete_expansion))
}

#[instrument(skip_all)]
pub async fn list_expansions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Expansion>>> {
    let rows = Expansion::list(&state.db, !user.is_admin).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, user))]
pub async fn get_expansion(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Expansion>> {
    match Expansion::find(&state.db, id).await? {
        Some(exp) if exp.published || user.is_admin => Ok(Json(exp)),
        _ => Err(ApiError::NotFound("expansion")),
    }
}

#[instrument(skip(state, admin, payload))]
pub async fn create_expansion(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(payload): ValidJson<ExpansionCreate>,
) -> ApiResult<(StatusCode, Json<Expansion>)> {
    let expansion = payload.into_expansion().insert(&state.db).await?;
    info!(admin_id = %admin.id, expansion_id = %expansion.id, "expansion created");
    Ok((StatusCode::CREATED, Json(expansion)))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_expansion(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<ExpansionUpdate>,
) -> ApiResult<Json<Expansion>> {
    let mut expansion = Expansion::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("expansion"))?;
    if payload.is_empty() {
        return Ok(Json(expansion));
    }

    payload.apply(&mut expansion);
    let saved = expansion
        .save(&state.db)
        .await?
        .ok_or(ApiError::NotFound("expansion"))?;
    info!(admin_id = %admin.id, expansion_id = %id, "expansion updated");
    Ok(Json(saved))
}

#[instrument(skip(state, admin))]
pub async fn delete_expansion(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Expansion::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("expansion"));
    }
    info!(admin_id = %admin.id, expansion_id = %id, "expansion deleted");
    Ok(StatusCode::NO_CONTENT)
}
