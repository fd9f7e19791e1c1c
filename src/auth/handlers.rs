use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{LoginResponse, UserCreate, UserLogin, UserResponse},
        repo_types::User,
    },
    validation::ValidJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<UserCreate>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    payload.email = normalize_email(&payload.email);

    let hash = hash_password_blocking(std::mem::take(&mut payload.password)).await?;
    let user = payload.into_user(hash);

    let Some(user) = user.insert(&state.db).await? else {
        warn!(email = %user.email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(LoginResponse::bearer(token, user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<UserLogin>,
) -> ApiResult<Json<LoginResponse>> {
    payload.email = normalize_email(&payload.email);

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse::bearer(token, user)))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
