use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, cards, expansions, packs, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(expansions::router())
                .merge(cards::router())
                .merge(packs::router())
                .merge(users::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(req: Request<Body>) -> (StatusCode, Value) {
        call_with(AppState::fake(), req).await
    }

    async fn call_with(state: AppState, req: Request<Body>) -> (StatusCode, Value) {
        let res = build_app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let res = build_app(AppState::fake()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_rejects_bad_email_before_touching_db() {
        let (status, body) = call(post_json(
            "/api/auth/register",
            r#"{"email":"not-an-email","nickname":"Ash","password":"pw123"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "email");
    }

    #[tokio::test]
    async fn login_reports_missing_password() {
        let (status, body) = call(post_json("/api/auth/login", r#"{"email":"a@b.com"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "password");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let req = Request::get("/api/auth/me").body(Body::empty()).unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);

        let (status, _) = call(post_json(
            "/api/packs/open",
            r#"{"expansion_id":"00000000-0000-0000-0000-000000000000"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let req = Request::get("/api/expansions")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::get("/api/admin/users")
            .header(header::AUTHORIZATION, "Basic YTpi")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid auth scheme");
    }

    #[tokio::test]
    async fn register_lists_every_bad_field() {
        let (status, body) =
            call(post_json("/api/auth/register", r#"{"email":"not-an-email"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let mut fields: Vec<_> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap().to_string())
            .collect();
        fields.sort();
        assert_eq!(fields, ["email", "nickname", "password"]);
    }

    fn authed(method: Method, uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn register_twice_conflicts(db: sqlx::PgPool) {
        let state = AppState::with_pool(db);
        let body = r#"{"email":"Ash@Pallet.Town","nickname":"Ash","password":"pw123"}"#;

        let (status, first) = call_with(state.clone(), post_json("/api/auth/register", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["user"]["email"], "ash@pallet.town");

        let again = r#"{"email":"ASH@pallet.town","nickname":"Other","password":"x"}"#;
        let (status, err) = call_with(state.clone(), post_json("/api/auth/register", again)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], 409);

        let login = r#"{"email":"ash@pallet.town","password":"pw123"}"#;
        let (status, logged_in) = call_with(state, post_json("/api/auth/login", login)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in["user"]["id"], first["user"]["id"]);
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn players_cannot_see_or_open_drafts(db: sqlx::PgPool) {
        use crate::{auth::jwt::JwtKeys, test_support};
        use axum::extract::FromRef;

        let state = AppState::with_pool(db.clone());
        let draft = test_support::expansion(&db, false).await;
        let empty = test_support::expansion(&db, true).await;
        let player = test_support::user(&db, false).await;
        let token = JwtKeys::from_ref(&state).sign(player.id).unwrap();

        let uri = format!("/api/expansions/{}", draft.id);
        let (status, _) = call_with(state.clone(), authed(Method::GET, &uri, &token, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let open = |id: uuid::Uuid| format!(r#"{{"expansion_id":"{id}"}}"#);
        let req = authed(Method::POST, "/api/packs/open", &token, &open(draft.id));
        let (status, _) = call_with(state.clone(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = authed(Method::POST, "/api/packs/open", &token, &open(empty.id));
        let (status, body) = call_with(state, req).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);
    }
}
