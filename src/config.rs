//! Loading agent configuration (prompts, optional mission catalog, celebration
//! fallback) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::catalog::MissionCfg;

/// Shown when the celebration provider fails or answers with nothing.
pub const DEFAULT_CELEBRATION: &str = "Amazing! You became a Space Master!";

/// Idle sessions older than this are evicted from the in-memory store.
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 120;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub missions: Vec<MissionCfg>,
  #[serde(default)]
  pub celebration_fallback: Option<String>,
  #[serde(default)]
  pub session_idle_minutes: Option<u64>,
}

impl AgentConfig {
  /// Non-empty fallback text, configured or built-in.
  pub fn celebration_fallback(&self) -> String {
    match &self.celebration_fallback {
      Some(s) if !s.trim().is_empty() => s.trim().to_string(),
      _ => DEFAULT_CELEBRATION.to_string(),
    }
  }

  pub fn session_ttl(&self) -> Duration {
    let minutes = self.session_idle_minutes.filter(|m| *m > 0).unwrap_or(DEFAULT_SESSION_IDLE_MINUTES);
    Duration::from_secs(minutes * 60)
  }
}

/// Prompts used by the OpenAI client. Defaults target primary-school math in a space theme.
/// You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub riddle_system: String,
  pub riddle_user_template: String,
  pub story_quest_system: String,
  pub story_quest_user_template: String,
  pub story_problem_system: String,
  pub story_problem_user_template: String,
  pub celebration_system: String,
  pub celebration_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      riddle_system: "You write math riddles for primary-school children. Respond ONLY with strict JSON.".into(),
      riddle_user_template: "Create one number riddle at difficulty '{difficulty}', e.g. \"Twice me plus 5 is 15, who am I?\". Return JSON with fields: riddle, options (exactly 4 short strings), correctAnswer (one of the options), explanation.".into(),
      story_quest_system: "You write short space adventures with a math question for children. Respond ONLY with strict JSON.".into(),
      story_quest_user_template: "Write a space-themed mission at difficulty '{difficulty}'. Tell a short story and end with a problem whose answer is a whole number. Return JSON with fields: story, question, answer (integer), reward.".into(),
      story_problem_system: "You write space-themed math word problems for primary-school children. Respond ONLY with strict JSON.".into(),
      story_problem_user_template: "Create a word problem at difficulty '{difficulty}' using operation '{operation}'. The answer must be a whole number. Return JSON with fields: story, question, correctAnswer (integer), hint.".into(),
      celebration_system: "You cheer on children who finished a math adventure. Keep it short and exciting.".into(),
      celebration_user_template: "Write a congratulation message for a child who completed every space mission with {score} points.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "math_galaxy", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "math_galaxy", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "math_galaxy", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}
