use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CardCreate, CardUpdate};
use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    cards::repo_types::{Card, SaveOutcome},
    error::{ApiError, ApiResult},
    expansions::repo_types::Expansion,
    state::AppState,
    validation::ValidJson,
};

#[derive(Debug, Deserialize)]
pub struct CardFilter {
    pub expansion_id: Option<Uuid>,
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards))
        .route("/cards/:id", get(get_card))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/cards", post(create_card))
        .route("/cards/:id", put(update_card).delete(delete_card))
}

#[instrument(skip(state, user))]
pub async fn list_cards(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<CardFilter>,
) -> ApiResult<Json<Vec<Card>>> {
    let cards = Card::list(&state.db, filter.expansion_id, !user.is_admin).await?;
    Ok(Json(cards))
}

#[instrument(skip(state, user))]
pub async fn get_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Card>> {
    let card = Card::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("card"))?;
    if !user.is_admin {
        let visible = Expansion::find(&state.db, card.expansion_id)
            .await?
            .is_some_and(|e| e.published);
        if !visible {
            return Err(ApiError::NotFound("card"));
        }
    }
    Ok(Json(card))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_card(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(payload): ValidJson<CardCreate>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    let card = payload
        .into_card()
        .insert(&state.db)
        .await?
        .ok_or(ApiError::NotFound("expansion"))?;
    info!(admin_id = %admin.id, card_id = %card.id, expansion_id = %card.expansion_id, "card created");
    Ok((StatusCode::CREATED, Json(card)))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_card(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<CardUpdate>,
) -> ApiResult<Json<Card>> {
    let mut card = Card::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("card"))?;
    if payload.is_empty() {
        return Ok(Json(card));
    }

    let previous_expansion = card.expansion_id;
    payload.apply(&mut card);
    let saved = match card.save(&state.db, previous_expansion).await? {
        SaveOutcome::Saved(saved) => saved,
        SaveOutcome::CardMissing => return Err(ApiError::NotFound("card")),
        SaveOutcome::ExpansionMissing => return Err(ApiError::NotFound("expansion")),
        SaveOutcome::Stale => {
            return Err(ApiError::Conflict("card was moved by another request".into()))
        }
    };
    info!(admin_id = %admin.id, card_id = %id, "card updated");
    Ok(Json(saved))
}

#[instrument(skip(state, admin))]
pub async fn delete_card(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Card::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("card"));
    }
    info!(admin_id = %admin.id, card_id = %id, "card deleted");
    Ok(StatusCode::NO_CONTENT)
}
