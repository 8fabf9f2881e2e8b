//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Session lifecycle (create, restart) and settings (difficulty, operation)
//!   - Mission selection / closing, driven through `GameState::apply`
//!   - Loading challenge content from the provider, guarded by request tokens
//!   - Evaluating answers and firing the end-of-campaign celebration
//!   - Stateless practice (drill question, story problem)

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, MissionKind, OperationChoice, Question, StoryProblem};
use crate::error::GameError;
use crate::game::{GameEvent, Phase};
use crate::generator::{generate_question, is_correct};
use crate::provider::{celebration_or_fallback, fetch_riddle, fetch_story_problem, fetch_story_quest, riddle_answer_matches};
use crate::state::{ActiveChallenge, AppState, ChallengeContent, Session};
use crate::util::parse_int_answer;

#[derive(Debug)]
pub enum LoadOutcome {
  Ready(Session),
  /// The challenge closed or changed while the provider was working; result dropped.
  Stale,
}

#[derive(Debug)]
pub struct AnswerOutcome {
  pub correct: bool,
  pub feedback: String,
  pub session: Session,
}

#[instrument(level = "info", skip(state))]
pub async fn new_session(state: &AppState) -> Session {
  let s = state.create_session().await;
  info!(target: "game", session = %s.id, "Session created");
  s
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn select_mission(state: &AppState, id: Uuid, mission_id: u32) -> Result<Session, GameError> {
  state
    .with_session(id, |s| {
      s.game = s.game.apply(GameEvent::SelectMission(mission_id))?;
      let token = s
        .game
        .request_token()
        .ok_or_else(|| GameError::invalid_operation("selection did not open a challenge"))?;
      let content = match s.game.active_mission().map(|m| m.kind) {
        Some(MissionKind::Arithmetic) => Some(ChallengeContent::Drill(generate_question(s.operation, s.game.difficulty))),
        _ => None,
      };
      s.challenge = Some(ActiveChallenge { token, content });
      info!(target: "game", session = %id, mission_id, seq = token.seq, "Mission selected");
      Ok(s.clone())
    })
    .await
}

/// Fetch content for the open challenge. The lock is released while the
/// provider runs; the result is stored only if the same challenge is still open.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn load_challenge(state: &AppState, id: Uuid) -> Result<LoadOutcome, GameError> {
  let (token, kind, difficulty, operation, ready) = state
    .with_session(id, |s| {
      let token = s
        .game
        .request_token()
        .ok_or_else(|| GameError::invalid_operation("no challenge is open"))?;
      let kind = s
        .game
        .active_mission()
        .map(|m| m.kind)
        .ok_or_else(|| GameError::invalid_operation("active mission is missing from the catalog"))?;
      let ready = s
        .challenge
        .as_ref()
        .is_some_and(|c| c.token == token && c.content.is_some());
      Ok((token, kind, s.game.difficulty, s.operation, ready))
    })
    .await?;

  if ready {
    return Ok(LoadOutcome::Ready(state.get_session(id).await?));
  }

  let provider = &*state.provider;
  let content = match kind {
    MissionKind::Riddle => ChallengeContent::Riddle(fetch_riddle(provider, difficulty).await?),
    MissionKind::Story | MissionKind::Boss => ChallengeContent::Story(fetch_story_quest(provider, difficulty).await?),
    MissionKind::Arithmetic => ChallengeContent::Drill(generate_question(operation, difficulty)),
  };

  state
    .with_session(id, |s| {
      if !s.game.accepts(&token) {
        debug!(target: "game", session = %id, mission_id = token.mission_id, seq = token.seq, "Discarding stale challenge content");
        return Ok(LoadOutcome::Stale);
      }
      // First writer wins: the client may already be looking at that content.
      if s.challenge.as_ref().is_some_and(|c| c.token == token && c.content.is_some()) {
        debug!(target: "game", session = %id, mission_id = token.mission_id, "Content already loaded; dropping duplicate fetch");
        return Ok(LoadOutcome::Ready(s.clone()));
      }
      s.challenge = Some(ActiveChallenge { token, content: Some(content) });
      info!(target: "game", session = %id, mission_id = token.mission_id, provider = provider.name(), "Challenge content ready");
      Ok(LoadOutcome::Ready(s.clone()))
    })
    .await
}

#[instrument(level = "info", skip(state, answer), fields(%id, answer_len = answer.len()))]
pub async fn submit_answer(state: &AppState, id: Uuid, answer: &str) -> Result<AnswerOutcome, GameError> {
  if answer.trim().is_empty() {
    return Err(GameError::invalid_argument("answer is empty"));
  }

  let (outcome, celebrate) = state
    .with_session(id, |s| {
      let token = s
        .game
        .request_token()
        .ok_or_else(|| GameError::invalid_operation("no challenge is open"))?;
      let content = s
        .challenge
        .as_ref()
        .filter(|c| c.token == token)
        .and_then(|c| c.content.as_ref())
        .ok_or_else(|| GameError::invalid_operation("challenge content is not loaded yet"))?;

      let (correct, is_drill, explanation) = match content {
        ChallengeContent::Riddle(r) => (riddle_answer_matches(r, answer), false, r.explanation.clone()),
        ChallengeContent::Story(q) => (parse_int_answer(answer) == Some(q.answer), false, String::new()),
        ChallengeContent::Drill(q) => (parse_int_answer(answer).is_some_and(|a| is_correct(q, a)), true, String::new()),
      };

      if !correct {
        let feedback = if is_drill {
          // No penalty: the drill just moves on to a new question.
          let next = generate_question(s.operation, s.game.difficulty);
          if let Some(c) = s.challenge.as_mut() {
            c.content = Some(ChallengeContent::Drill(next));
          }
          "Not quite! Here is a new one.".to_string()
        } else {
          "Hmm, think about it once more...".to_string()
        };
        debug!(target: "game", session = %id, mission_id = token.mission_id, "Wrong answer");
        return Ok((AnswerOutcome { correct: false, feedback, session: s.clone() }, None));
      }

      s.game = s.game.apply(GameEvent::SucceedMission)?;
      s.challenge = None;
      info!(target: "game", session = %id, mission_id = token.mission_id, score = s.game.score, phase = ?s.game.phase, "Mission completed");

      let celebrate = (s.game.phase == Phase::Finished).then_some((s.run, s.game.score));
      let feedback = if explanation.is_empty() {
        "Perfect! The path is open!".to_string()
      } else {
        format!("Perfect! The path is open! {explanation}")
      };
      Ok((AnswerOutcome { correct: true, feedback, session: s.clone() }, celebrate))
    })
    .await?;

  if let Some((run, score)) = celebrate {
    spawn_celebration(state, id, run, score);
  }
  Ok(outcome)
}

/// Best-effort celebration text. The `finished` transition already happened;
/// this only decorates the session once the provider answers.
fn spawn_celebration(state: &AppState, id: Uuid, run: u64, score: u32) {
  let state = state.clone();
  tokio::spawn(async move {
    let text = celebration_or_fallback(&*state.provider, score, &state.celebration_fallback).await;
    let applied = state
      .with_session(id, |s| {
        if s.run == run && s.game.phase == Phase::Finished {
          s.celebration = Some(text);
          Ok(true)
        } else {
          Ok(false)
        }
      })
      .await;
    match applied {
      Ok(true) => info!(target: "game", session = %id, score, "Celebration attached"),
      Ok(false) => debug!(target: "game", session = %id, run, "Discarding celebration for a previous run"),
      Err(e) => warn!(target: "game", session = %id, error = %e, "Celebration arrived for a missing session"),
    }
  });
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn close_challenge(state: &AppState, id: Uuid) -> Result<Session, GameError> {
  state
    .with_session(id, |s| {
      s.game = s.game.apply(GameEvent::CloseChallenge)?;
      s.challenge = None;
      info!(target: "game", session = %id, "Challenge closed");
      Ok(s.clone())
    })
    .await
}

#[instrument(level = "info", skip(state), fields(%id, %difficulty))]
pub async fn set_difficulty(state: &AppState, id: Uuid, difficulty: Difficulty) -> Result<Session, GameError> {
  state
    .with_session(id, |s| {
      s.game = s.game.apply(GameEvent::SetDifficulty(difficulty))?;
      Ok(s.clone())
    })
    .await
}

#[instrument(level = "info", skip(state), fields(%id, %operation))]
pub async fn set_operation(state: &AppState, id: Uuid, operation: OperationChoice) -> Result<Session, GameError> {
  state
    .with_session(id, |s| {
      s.operation = operation;
      Ok(s.clone())
    })
    .await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn restart(state: &AppState, id: Uuid) -> Result<Session, GameError> {
  let catalog = &state.catalog;
  state
    .with_session(id, |s| {
      s.restart(catalog);
      info!(target: "game", session = %id, run = s.run, "Game restarted");
      Ok(s.clone())
    })
    .await
}

pub fn practice_question(operation: OperationChoice, difficulty: Difficulty) -> Question {
  generate_question(operation, difficulty)
}

#[instrument(level = "info", skip(state), fields(%difficulty, %operation))]
pub async fn practice_story_problem(
  state: &AppState,
  difficulty: Difficulty,
  operation: OperationChoice,
) -> Result<StoryProblem, GameError> {
  fetch_story_problem(&*state.provider, difficulty, operation).await
}
