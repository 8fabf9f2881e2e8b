//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and log include parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, OperationChoice};
use crate::error::GameError;
use crate::logic::{self, LoadOutcome};
use crate::protocol::*;
use crate::state::AppState;

impl IntoResponse for GameError {
  fn into_response(self) -> Response {
    let status = match &self {
      GameError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
      GameError::InvalidOperation(_) => StatusCode::CONFLICT,
      GameError::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
      GameError::UnknownSession(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(ErrorOut { kind: self.kind(), message: self.to_string() })).into_response()
  }
}

type ApiResult<T> = Result<Json<T>, GameError>;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, provider: state.provider.name() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let s = logic::new_session(&state).await;
  (StatusCode::CREATED, Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<SessionOut> {
  let s = state.get_session(id).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state, body), fields(%id, mission_id = body.mission_id))]
pub async fn http_select_mission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SelectIn>,
) -> ApiResult<SessionOut> {
  let s = logic::select_mission(&state, id, body.mission_id).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_load_challenge(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Response, GameError> {
  match logic::load_challenge(&state, id).await? {
    LoadOutcome::Ready(s) => Ok(Json(to_out(&s)).into_response()),
    LoadOutcome::Stale => {
      warn!(target: "game", session = %id, "HTTP challenge load went stale");
      let body = ErrorOut { kind: "stale", message: "challenge was closed before its content arrived".into() };
      Ok((StatusCode::CONFLICT, Json(body)).into_response())
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(%id, answer_len = body.answer.len()))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> ApiResult<AnswerOut> {
  let out = logic::submit_answer(&state, id, &body.answer).await?;
  info!(target: "game", session = %id, correct = out.correct, "HTTP answer evaluated");
  Ok(Json(AnswerOut { correct: out.correct, feedback: out.feedback, session: to_out(&out.session) }))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_close_challenge(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<SessionOut> {
  let s = logic::close_challenge(&state, id).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state, body), fields(%id, difficulty = %body.difficulty))]
pub async fn http_set_difficulty(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DifficultyIn>,
) -> ApiResult<SessionOut> {
  let difficulty: Difficulty = body.difficulty.parse()?;
  let s = logic::set_difficulty(&state, id, difficulty).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state, body), fields(%id, operation = %body.operation))]
pub async fn http_set_operation(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<OperationIn>,
) -> ApiResult<SessionOut> {
  let operation: OperationChoice = body.operation.parse()?;
  let s = logic::set_operation(&state, id, operation).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_restart(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<SessionOut> {
  let s = logic::restart(&state, id).await?;
  Ok(Json(to_out(&s)))
}

/// Missing query values fall back to `mixed` / `easy`; present but unknown ones are rejected.
pub(crate) fn practice_params(
  operation: Option<&str>,
  difficulty: Option<&str>,
) -> Result<(OperationChoice, Difficulty), GameError> {
  let operation: OperationChoice = operation.map(str::parse::<OperationChoice>).transpose()?.unwrap_or_default();
  let difficulty: Difficulty = difficulty.map(str::parse::<Difficulty>).transpose()?.unwrap_or_default();
  Ok((operation, difficulty))
}

#[instrument(level = "info", skip_all, fields(operation = ?q.operation, difficulty = ?q.difficulty))]
pub async fn http_practice_question(Query(q): Query<PracticeQuery>) -> ApiResult<crate::domain::Question> {
  let (operation, difficulty) = practice_params(q.operation.as_deref(), q.difficulty.as_deref())?;
  Ok(Json(logic::practice_question(operation, difficulty)))
}

#[instrument(level = "info", skip(state), fields(operation = ?q.operation, difficulty = ?q.difficulty))]
pub async fn http_practice_story_problem(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PracticeQuery>,
) -> ApiResult<StoryProblemOut> {
  let (operation, difficulty) = practice_params(q.operation.as_deref(), q.difficulty.as_deref())?;
  let problem = logic::practice_story_problem(&state, difficulty, operation).await?;
  Ok(Json(StoryProblemOut { problem }))
}
