//! Content provider seam: riddles, story quests, story problems and the
//! end-of-campaign celebration text.
//!
//! Implementations: `openai::OpenAI` (when an API key is configured) and
//! `seeds::SeedBank` (built-in offline content). Everything a provider returns
//! goes through the `fetch_*` helpers here, which validate the shape before the
//! game ever sees it.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{Difficulty, OperationChoice, Riddle, StoryProblem, StoryQuest};
use crate::error::GameError;
use crate::util::normalize_answer;

pub const RIDDLE_OPTION_COUNT: usize = 4;

#[async_trait]
pub trait ContentProvider: Send + Sync {
  /// Short label for logs.
  fn name(&self) -> &'static str;

  async fn riddle(&self, difficulty: Difficulty) -> Result<Riddle, GameError>;

  async fn story_quest(&self, difficulty: Difficulty) -> Result<StoryQuest, GameError>;

  async fn story_problem(
    &self,
    difficulty: Difficulty,
    operation: OperationChoice,
  ) -> Result<StoryProblem, GameError>;

  async fn celebration(&self, score: u32) -> Result<String, GameError>;
}

/// Case-insensitive, whitespace-trimmed comparison used for riddle answers.
pub fn riddle_answer_matches(riddle: &Riddle, answer: &str) -> bool {
  normalize_answer(&riddle.correct_answer) == normalize_answer(answer)
}

/// Four options, non-empty text, and the correct answer matching exactly one option.
pub fn validate_riddle(riddle: Riddle) -> Result<Riddle, GameError> {
  if riddle.text.trim().is_empty() {
    return Err(GameError::provider("riddle text is empty"));
  }
  if riddle.options.len() != RIDDLE_OPTION_COUNT {
    return Err(GameError::provider(format!(
      "riddle has {} options, expected {RIDDLE_OPTION_COUNT}",
      riddle.options.len()
    )));
  }
  let matches = riddle.options.iter().filter(|o| riddle_answer_matches(&riddle, o)).count();
  if matches != 1 {
    return Err(GameError::provider(format!(
      "riddle answer matches {matches} options, expected exactly one"
    )));
  }
  Ok(riddle)
}

pub fn validate_story_quest(quest: StoryQuest) -> Result<StoryQuest, GameError> {
  if quest.story.trim().is_empty() || quest.question.trim().is_empty() {
    return Err(GameError::provider("story quest is missing story or question"));
  }
  Ok(quest)
}

pub fn validate_story_problem(problem: StoryProblem) -> Result<StoryProblem, GameError> {
  if problem.story.trim().is_empty() || problem.question.trim().is_empty() {
    return Err(GameError::provider("story problem is missing story or question"));
  }
  Ok(problem)
}

pub async fn fetch_riddle(provider: &dyn ContentProvider, difficulty: Difficulty) -> Result<Riddle, GameError> {
  let r = provider.riddle(difficulty).await.and_then(validate_riddle);
  if let Err(e) = &r {
    warn!(target: "provider", provider = provider.name(), %difficulty, error = %e, "Riddle rejected");
  }
  r
}

pub async fn fetch_story_quest(
  provider: &dyn ContentProvider,
  difficulty: Difficulty,
) -> Result<StoryQuest, GameError> {
  let r = provider.story_quest(difficulty).await.and_then(validate_story_quest);
  if let Err(e) = &r {
    warn!(target: "provider", provider = provider.name(), %difficulty, error = %e, "Story quest rejected");
  }
  r
}

pub async fn fetch_story_problem(
  provider: &dyn ContentProvider,
  difficulty: Difficulty,
  operation: OperationChoice,
) -> Result<StoryProblem, GameError> {
  let r = provider.story_problem(difficulty, operation).await.and_then(validate_story_problem);
  if let Err(e) = &r {
    warn!(target: "provider", provider = provider.name(), %difficulty, %operation, error = %e, "Story problem rejected");
  }
  r
}

/// Celebration text never fails: errors and blank replies turn into `fallback`.
pub async fn celebration_or_fallback(provider: &dyn ContentProvider, score: u32, fallback: &str) -> String {
  match provider.celebration(score).await {
    Ok(text) if !text.trim().is_empty() => {
      debug!(target: "provider", provider = provider.name(), score, "Celebration received");
      text.trim().to_string()
    }
    Ok(_) => {
      warn!(target: "provider", provider = provider.name(), score, "Empty celebration; using fallback");
      fallback.to_string()
    }
    Err(e) => {
      warn!(target: "provider", provider = provider.name(), score, error = %e, "Celebration failed; using fallback");
      fallback.to_string()
    }
  }
}
