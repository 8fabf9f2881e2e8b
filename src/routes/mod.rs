//! Router assembly: session + practice endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - Session and practice API under `/api/v1/...`
/// - Static frontend from `STATIC_DIR` (default `./static`) with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".to_string());
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir.trim_end_matches('/'))));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Sessions
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/sessions", post(http::http_create_session))
        .route("/api/v1/sessions/:id", get(http::http_get_session))
        .route("/api/v1/sessions/:id/select", post(http::http_select_mission))
        .route("/api/v1/sessions/:id/challenge", post(http::http_load_challenge))
        .route("/api/v1/sessions/:id/answer", post(http::http_submit_answer))
        .route("/api/v1/sessions/:id/close", post(http::http_close_challenge))
        .route("/api/v1/sessions/:id/difficulty", post(http::http_set_difficulty))
        .route("/api/v1/sessions/:id/operation", post(http::http_set_operation))
        .route("/api/v1/sessions/:id/restart", post(http::http_restart))
        // Practice
        .route("/api/v1/practice/question", get(http::http_practice_question))
        .route("/api/v1/practice/story_problem", get(http::http_practice_story_problem))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
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

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::catalog::MissionCatalog;
    use crate::config::AgentConfig;
    use crate::domain::{Difficulty, OperationChoice, Riddle, StoryProblem, StoryQuest};
    use crate::error::GameError;
    use crate::provider::ContentProvider;
    use crate::seeds::SeedBank;

    fn app() -> Router {
        let state = AppState::with_parts(MissionCatalog::default(), Arc::new(SeedBank), &AgentConfig::default());
        build_router(Arc::new(state))
    }

    /// Riddles arrive only after `release` is notified.
    #[derive(Default)]
    struct SlowRiddles {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ContentProvider for SlowRiddles {
        fn name(&self) -> &'static str { "slow_riddles" }
        async fn riddle(&self, _: Difficulty) -> Result<Riddle, GameError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Riddle {
                text: "How many moons does Earth have?".into(),
                options: vec!["0".into(), "1".into(), "2".into(), "3".into()],
                correct_answer: "1".into(),
                explanation: String::new(),
            })
        }
        async fn story_quest(&self, _: Difficulty) -> Result<StoryQuest, GameError> {
            Err(GameError::provider("offline"))
        }
        async fn story_problem(&self, _: Difficulty, _: OperationChoice) -> Result<StoryProblem, GameError> {
            Err(GameError::provider("offline"))
        }
        async fn celebration(&self, _: u32) -> Result<String, GameError> { Ok(String::new()) }
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn new_session(app: &Router) -> String {
        let (status, v) = call(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        v["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let (status, v) = call(&app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["ok"], true);
        assert_eq!(v["provider"], "seed_bank");
    }

    #[tokio::test]
    async fn new_session_starts_on_the_map() {
        let app = app();
        let id = new_session(&app).await;
        let (status, v) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["phase"], "map");
        assert_eq!(v["score"], 0);
        assert_eq!(v["currentLevel"], 1);
        assert_eq!(v["difficulty"], "easy");
        assert_eq!(v["missions"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn selecting_a_locked_mission_conflicts() {
        let app = app();
        let id = new_session(&app).await;
        let (status, v) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/select"),
            Some(serde_json::json!({ "missionId": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(v["kind"], "invalid_operation");
    }

    #[tokio::test]
    async fn riddle_round_trip_over_http() {
        let app = app();
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/select"),
            Some(serde_json::json!({ "missionId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, v) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["challenge"]["kind"], "riddle");
        assert_eq!(v["challenge"]["options"].as_array().unwrap().len(), 4);

        let (status, v) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(serde_json::json!({ "answer": "definitely not an option" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["correct"], false);
        assert_eq!(v["session"]["phase"], "challenge");
    }

    #[tokio::test]
    async fn challenge_closed_mid_load_reports_stale_conflict() {
        let provider = Arc::new(SlowRiddles::default());
        let state = AppState::with_parts(MissionCatalog::default(), provider.clone(), &AgentConfig::default());
        let app = build_router(Arc::new(state));
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/select"),
            Some(serde_json::json!({ "missionId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let bg = app.clone();
        let uri = format!("/api/v1/sessions/{id}/challenge");
        let pending = tokio::spawn(async move { call(&bg, Method::POST, &uri, None).await });
        provider.started.notified().await;

        let (status, v) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/close"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["phase"], "map");
        provider.release.notify_one();

        let (status, v) = pending.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(v["kind"], "stale");

        let (_, v) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(v["phase"], "map");
        assert!(v.get("challenge").is_none());
    }

    #[tokio::test]
    async fn operation_filter_is_set_and_validated() {
        let app = app();
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/operation");

        let (status, v) = call(&app, Method::POST, &uri, Some(serde_json::json!({ "operation": "division" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["operation"], "division");

        let (status, v) = call(&app, Method::POST, &uri, Some(serde_json::json!({ "operation": "modulo" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["kind"], "invalid_argument");
    }

    #[tokio::test]
    async fn restart_resets_progress_but_keeps_the_session() {
        let app = app();
        let id = new_session(&app).await;
        call(&app, Method::POST, &format!("/api/v1/sessions/{id}/difficulty"), Some(serde_json::json!({ "difficulty": "hard" }))).await;
        call(&app, Method::POST, &format!("/api/v1/sessions/{id}/operation"), Some(serde_json::json!({ "operation": "addition" }))).await;
        call(&app, Method::POST, &format!("/api/v1/sessions/{id}/select"), Some(serde_json::json!({ "missionId": 1 }))).await;

        let (status, v) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/restart"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["id"], id.as_str());
        assert_eq!(v["phase"], "map");
        assert_eq!(v["score"], 0);
        assert_eq!(v["difficulty"], "easy");
        assert_eq!(v["operation"], "addition");
        assert!(v["activeMissionId"].is_null());

        let (status, _) = call(&app, Method::POST, &format!("/api/v1/sessions/{}/restart", uuid::Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_difficulty_is_a_bad_request() {
        let app = app();
        let id = new_session(&app).await;
        let (status, v) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/difficulty"),
            Some(serde_json::json!({ "difficulty": "impossible" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["kind"], "invalid_argument");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, v) = call(&app(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(v["kind"], "unknown_session");
    }

    #[tokio::test]
    async fn practice_question_uses_query_filters() {
        let (status, v) = call(
            &app(),
            Method::GET,
            "/api/v1/practice/question?operation=multiplication&difficulty=medium",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["operation"], "multiplication");
        let a = v["operand1"].as_i64().unwrap();
        let b = v["operand2"].as_i64().unwrap();
        assert_eq!(v["correctAnswer"].as_i64().unwrap(), a * b);
        assert!(v["options"].as_array().unwrap().iter().any(|o| o.as_i64() == Some(a * b)));

        let (status, _) = call(&app(), Method::GET, "/api/v1/practice/question?operation=modulo", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn practice_story_problem_from_seed_bank() {
        let (status, v) = call(&app(), Method::GET, "/api/v1/practice/story_problem?operation=addition", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(v["problem"]["story"].as_str().is_some_and(|s| !s.is_empty()));
        assert!(v["problem"]["correctAnswer"].is_i64());
    }
}
