//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::GameError;
use crate::logic::{self, LoadOutcome};
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::routes::http::practice_params;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "math_galaxy", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "math_galaxy", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "math_galaxy", message = incoming.label(), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { kind: "invalid_json", message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "kind": "serialization", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "math_galaxy", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "math_galaxy", "WebSocket disconnected");
}

fn error_msg(e: GameError) -> ServerWsMessage {
  ServerWsMessage::Error { kind: e.kind(), message: e.to_string() }
}

fn session_msg(r: Result<crate::state::Session, GameError>) -> ServerWsMessage {
  match r {
    Ok(s) => ServerWsMessage::Session { session: to_out(&s) },
    Err(e) => error_msg(e),
  }
}

#[instrument(level = "info", skip_all, fields(message = msg.label()))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewSession => {
      let s = logic::new_session(state).await;
      ServerWsMessage::Session { session: to_out(&s) }
    }

    ClientWsMessage::GetSession { session_id } => session_msg(state.get_session(session_id).await),

    ClientWsMessage::SelectMission { session_id, mission_id } => {
      session_msg(logic::select_mission(state, session_id, mission_id).await)
    }

    ClientWsMessage::LoadChallenge { session_id } => match logic::load_challenge(state, session_id).await {
      Ok(LoadOutcome::Ready(s)) => ServerWsMessage::Session { session: to_out(&s) },
      Ok(LoadOutcome::Stale) => ServerWsMessage::ChallengeStale,
      Err(e) => error_msg(e),
    },

    ClientWsMessage::SubmitAnswer { session_id, answer } => {
      match logic::submit_answer(state, session_id, &answer).await {
        Ok(out) => {
          info!(target: "game", session = %session_id, answer_len = answer.len(), correct = out.correct, "WS answer evaluated");
          ServerWsMessage::AnswerResult { correct: out.correct, feedback: out.feedback, session: to_out(&out.session) }
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::CloseChallenge { session_id } => session_msg(logic::close_challenge(state, session_id).await),

    ClientWsMessage::SetDifficulty { session_id, difficulty } => match difficulty.parse() {
      Ok(d) => session_msg(logic::set_difficulty(state, session_id, d).await),
      Err(e) => error_msg(e),
    },

    ClientWsMessage::SetOperation { session_id, operation } => match operation.parse() {
      Ok(op) => session_msg(logic::set_operation(state, session_id, op).await),
      Err(e) => error_msg(e),
    },

    ClientWsMessage::Restart { session_id } => session_msg(logic::restart(state, session_id).await),

    ClientWsMessage::PracticeQuestion { operation, difficulty } => {
      match practice_params(operation.as_deref(), difficulty.as_deref()) {
        Ok((op, d)) => ServerWsMessage::Question { question: logic::practice_question(op, d) },
        Err(e) => error_msg(e),
      }
    }
  }
}
