use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{OpenPackRequest, OpenPackResponse},
    services::open_pack,
};
use crate::{
    auth::extractors::CurrentUser, error::ApiResult, state::AppState, validation::ValidJson,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/packs/open", post(open))
}

#[instrument(skip(state, user))]
pub async fn open(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<OpenPackRequest>,
) -> ApiResult<Json<OpenPackResponse>> {
    let response = open_pack(&state, &user, body.expansion_id).await?;
    Ok(Json(response))
}
