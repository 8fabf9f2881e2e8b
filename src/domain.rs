//! Domain models: difficulty, operations, missions, generated questions and
//! the structured payloads returned by content providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::GameError;

/// Coarse difficulty knob. Scales numeric ranges and is passed to providers as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Difficulty {
  type Err = GameError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(GameError::invalid_argument(format!("unknown difficulty '{other}'"))),
    }
  }
}

/// A concrete arithmetic operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Addition,
  Subtraction,
  Multiplication,
  Division,
}

impl Operation {
  pub const ALL: [Operation; 4] = [
    Operation::Addition,
    Operation::Subtraction,
    Operation::Multiplication,
    Operation::Division,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Operation::Addition => "addition",
      Operation::Subtraction => "subtraction",
      Operation::Multiplication => "multiplication",
      Operation::Division => "division",
    }
  }

  /// Operator glyph shown to the player.
  pub fn symbol(self) -> &'static str {
    match self {
      Operation::Addition => "+",
      Operation::Subtraction => "-",
      Operation::Multiplication => "×",
      Operation::Division => "÷",
    }
  }
}

/// Operation filter: one fixed operation, or `mixed` (uniform pick per question).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationChoice {
  Addition,
  Subtraction,
  Multiplication,
  Division,
  #[default]
  Mixed,
}

impl OperationChoice {
  /// `None` for `mixed`.
  pub fn fixed(self) -> Option<Operation> {
    match self {
      OperationChoice::Addition => Some(Operation::Addition),
      OperationChoice::Subtraction => Some(Operation::Subtraction),
      OperationChoice::Multiplication => Some(Operation::Multiplication),
      OperationChoice::Division => Some(Operation::Division),
      OperationChoice::Mixed => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    self.fixed().map(Operation::as_str).unwrap_or("mixed")
  }
}

impl From<Operation> for OperationChoice {
  fn from(op: Operation) -> Self {
    match op {
      Operation::Addition => OperationChoice::Addition,
      Operation::Subtraction => OperationChoice::Subtraction,
      Operation::Multiplication => OperationChoice::Multiplication,
      Operation::Division => OperationChoice::Division,
    }
  }
}

impl fmt::Display for OperationChoice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OperationChoice {
  type Err = GameError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "addition" => Ok(OperationChoice::Addition),
      "subtraction" => Ok(OperationChoice::Subtraction),
      "multiplication" => Ok(OperationChoice::Multiplication),
      "division" => Ok(OperationChoice::Division),
      "mixed" => Ok(OperationChoice::Mixed),
      other => Err(GameError::invalid_argument(format!("unknown operation '{other}'"))),
    }
  }
}

/// Which kind of challenge a mission opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
  Riddle,
  Story,
  Boss,
  Arithmetic,
}

/// One node of the campaign. Identity, kind and title never change after init.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
  pub id: u32,
  #[serde(rename = "type")]
  pub kind: MissionKind,
  pub title: String,
  pub completed: bool,
}

/// A generated arithmetic question. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: Uuid,
  pub operand1: i64,
  pub operand2: i64,
  pub operation: Operation,
  pub correct_answer: i64,
  pub options: Vec<i64>,
}

/// Riddle payload (multiple choice, string answers).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Riddle {
  #[serde(rename = "riddle")]
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default)]
  pub explanation: String,
}

/// Story quest payload (free integer answer). Used by story and boss missions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryQuest {
  pub story: String,
  pub question: String,
  #[serde(deserialize_with = "integral")]
  pub answer: i64,
  #[serde(default)]
  pub reward: String,
}

/// Story problem payload for free practice (integer answer + hint).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryProblem {
  pub story: String,
  pub question: String,
  #[serde(deserialize_with = "integral")]
  pub correct_answer: i64,
  #[serde(default)]
  pub hint: String,
}

/// Models answer JSON "number" fields with `12` or `12.0`; accept both, reject fractions.
fn integral<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
  let n = serde_json::Number::deserialize(d)?;
  if let Some(i) = n.as_i64() {
    return Ok(i);
  }
  match n.as_f64() {
    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
    _ => Err(serde::de::Error::custom(format!("expected an integer, got {n}"))),
  }
}
