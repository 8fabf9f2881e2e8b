//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request either plain text or a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Difficulty, OperationChoice, Riddle, StoryProblem, StoryQuest};
use crate::error::GameError;
use crate::provider::ContentProvider;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, prompts })
  }

  async fn complete(&self, req: &ChatCompletionRequest) -> Result<String, GameError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "math-galaxy-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(req).send().await.map_err(|e| GameError::provider(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(target: "provider", %status, elapsed = ?start.elapsed(), "OpenAI request failed");
      return Err(GameError::provider(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| GameError::provider(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "provider", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, elapsed = ?start.elapsed(), "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    Ok(text)
  }

  /// Plain-text chat completion. Used for the celebration message.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, GameError> {
    let req = ChatCompletionRequest::new(model, system, user, temperature, None);
    self.complete(&req).await
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, GameError> {
    let req = ChatCompletionRequest::new(
      model,
      system,
      user,
      temperature,
      Some(ResponseFormat { r#type: "json_object".into() }),
    );
    let text = self.complete(&req).await?;
    serde_json::from_str::<T>(&text).map_err(|e| {
      info!(target: "provider", len = text.len(), preview = %trunc_for_log(&text, 60), "Unparsable model JSON");
      GameError::provider(format!("JSON parse error: {}", e))
    })
  }
}

#[async_trait]
impl ContentProvider for OpenAI {
  fn name(&self) -> &'static str { "openai" }

  #[instrument(level = "info", skip(self), fields(%difficulty, model = %self.fast_model))]
  async fn riddle(&self, difficulty: Difficulty) -> Result<Riddle, GameError> {
    let user = fill_template(&self.prompts.riddle_user_template, &[("difficulty", difficulty.as_str())]);
    self.chat_json(&self.fast_model, &self.prompts.riddle_system, &user, 0.9).await
  }

  #[instrument(level = "info", skip(self), fields(%difficulty, model = %self.fast_model))]
  async fn story_quest(&self, difficulty: Difficulty) -> Result<StoryQuest, GameError> {
    let user = fill_template(&self.prompts.story_quest_user_template, &[("difficulty", difficulty.as_str())]);
    self.chat_json(&self.fast_model, &self.prompts.story_quest_system, &user, 0.9).await
  }

  #[instrument(level = "info", skip(self), fields(%difficulty, %operation, model = %self.fast_model))]
  async fn story_problem(
    &self,
    difficulty: Difficulty,
    operation: OperationChoice,
  ) -> Result<StoryProblem, GameError> {
    let user = fill_template(
      &self.prompts.story_problem_user_template,
      &[("difficulty", difficulty.as_str()), ("operation", operation.as_str())],
    );
    self.chat_json(&self.fast_model, &self.prompts.story_problem_system, &user, 0.9).await
  }

  #[instrument(level = "info", skip(self), fields(model = %self.strong_model))]
  async fn celebration(&self, score: u32) -> Result<String, GameError> {
    let score = score.to_string();
    let user = fill_template(&self.prompts.celebration_user_template, &[("score", score.as_str())]);
    self.chat_plain(&self.strong_model, &self.prompts.celebration_system, &user, 0.8).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
  fn new(model: &str, system: &str, user: &str, temperature: f32, response_format: Option<ResponseFormat>) -> Self {
    Self {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format,
      max_tokens: None,
    }
  }
}

#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_requests_ask_for_json_object_format() {
    let req = ChatCompletionRequest::new(
      "gpt-4o-mini",
      "sys",
      "user",
      0.5,
      Some(ResponseFormat { r#type: "json_object".into() }),
    );
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["response_format"]["type"], "json_object");
    assert_eq!(v["messages"][0]["role"], "system");
    assert!(v.get("max_tokens").is_none());
  }

  #[test]
  fn extracts_error_message_from_body() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_openai_error("<html>"), None);
  }

  #[test]
  fn model_riddle_json_parses_into_domain_type() {
    let text = r#"{"riddle":"Twice me plus 5 is 15","options":["4","5","6","10"],"correctAnswer":"5","explanation":"2x5+5"}"#;
    let r: Riddle = serde_json::from_str(text).unwrap();
    assert!(crate::provider::validate_riddle(r).is_ok());
  }
}
