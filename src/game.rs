//! Game state machine: progression, scoring and terminal celebration.
//!
//! `GameState` is a plain value. Every transition is a pure function
//! `apply(&GameState, GameEvent) -> Result<GameState, GameError>`; a rejected
//! event returns an error and the caller keeps the old value untouched.
//!
//! Async content fetches are bound to a `RequestToken`. Results are applied
//! only while `accepts(token)` holds, so a response that lands after the player
//! closed (or re-opened) the challenge is dropped.

use serde::Serialize;

use crate::catalog::MissionCatalog;
use crate::domain::{Difficulty, Mission};
use crate::error::GameError;

/// Flat reward per completed mission, independent of difficulty/operation.
pub const MISSION_REWARD: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Map,
  Challenge,
  Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
  SelectMission(u32),
  CloseChallenge,
  SucceedMission,
  SetDifficulty(Difficulty),
}

/// Identifies one challenge opening. A new selection always yields a new `seq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken {
  pub mission_id: u32,
  pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
  pub score: u32,
  /// 1-based pointer to the first unfinished mission.
  pub current_level: u32,
  pub missions: Vec<Mission>,
  pub phase: Phase,
  pub difficulty: Difficulty,
  pub active_mission_id: Option<u32>,
  challenge_seq: u64,
}

impl GameState {
  pub fn new(catalog: &MissionCatalog) -> Self {
    Self {
      score: 0,
      current_level: 1,
      missions: catalog.missions(),
      phase: Phase::Map,
      difficulty: Difficulty::default(),
      active_mission_id: None,
      challenge_seq: 0,
    }
  }

  pub fn apply(&self, event: GameEvent) -> Result<GameState, GameError> {
    match event {
      GameEvent::SelectMission(id) => self.select(id),
      GameEvent::CloseChallenge => self.close(),
      GameEvent::SucceedMission => self.succeed(),
      GameEvent::SetDifficulty(difficulty) => Ok(GameState { difficulty, ..self.clone() }),
    }
  }

  fn select(&self, id: u32) -> Result<GameState, GameError> {
    if self.phase != Phase::Map {
      return Err(GameError::invalid_operation(format!(
        "cannot select mission {id} while in {:?}",
        self.phase
      )));
    }
    if self.mission(id).is_none() {
      return Err(GameError::invalid_operation(format!("mission {id} does not exist")));
    }
    if self.is_locked(id) {
      return Err(GameError::invalid_operation(format!(
        "mission {id} is locked (current level {})",
        self.current_level
      )));
    }
    Ok(GameState {
      phase: Phase::Challenge,
      active_mission_id: Some(id),
      challenge_seq: self.challenge_seq + 1,
      ..self.clone()
    })
  }

  fn close(&self) -> Result<GameState, GameError> {
    if self.phase != Phase::Challenge {
      return Err(GameError::invalid_operation(format!("no challenge to close in {:?}", self.phase)));
    }
    Ok(GameState { phase: Phase::Map, active_mission_id: None, ..self.clone() })
  }

  fn succeed(&self) -> Result<GameState, GameError> {
    let active = match (self.phase, self.active_mission_id) {
      (Phase::Challenge, Some(id)) => id,
      _ => {
        return Err(GameError::invalid_operation(format!(
          "cannot succeed a mission while in {:?}",
          self.phase
        )))
      }
    };

    let mut next = self.clone();
    for m in next.missions.iter_mut().filter(|m| m.id == active) {
      m.completed = true;
    }
    next.score = self.score.saturating_add(MISSION_REWARD);
    next.active_mission_id = None;

    if active as usize == self.missions.len() {
      next.phase = Phase::Finished;
    } else {
      // Replaying an earlier mission must not skip ahead.
      next.current_level = self.current_level.max(active + 1);
      next.phase = Phase::Map;
    }
    Ok(next)
  }

  pub fn mission(&self, id: u32) -> Option<&Mission> {
    self.missions.iter().find(|m| m.id == id)
  }

  pub fn active_mission(&self) -> Option<&Mission> {
    self.active_mission_id.and_then(|id| self.mission(id))
  }

  pub fn is_locked(&self, id: u32) -> bool { id > self.current_level }

  /// The single mission the player is expected to play next.
  pub fn is_current(&self, id: u32) -> bool {
    self.phase != Phase::Finished && id == self.current_level
  }

  /// Token for the challenge that is open right now.
  pub fn request_token(&self) -> Option<RequestToken> {
    match (self.phase, self.active_mission_id) {
      (Phase::Challenge, Some(mission_id)) => Some(RequestToken { mission_id, seq: self.challenge_seq }),
      _ => None,
    }
  }

  /// Whether a result fetched under `token` may still be applied.
  pub fn accepts(&self, token: &RequestToken) -> bool {
    self.request_token().as_ref() == Some(token)
  }
}
