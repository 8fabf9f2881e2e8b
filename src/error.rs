//! Error taxonomy shared by the generator, the game state machine and providers.
//!
//! `InvalidArgument` / `InvalidOperation` are caller bugs and are surfaced as-is.
//! `ProviderFailure` is recoverable: the client shows an error and may retry.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
  /// Malformed operation/difficulty literal.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// Transition attempted from an incompatible phase (or a locked mission).
  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  /// External content provider failed or returned unusable data.
  #[error("provider failure: {0}")]
  ProviderFailure(String),

  #[error("unknown session: {0}")]
  UnknownSession(String),
}

impl GameError {
  pub fn invalid_argument(msg: impl Into<String>) -> Self {
    GameError::InvalidArgument(msg.into())
  }

  pub fn invalid_operation(msg: impl Into<String>) -> Self {
    GameError::InvalidOperation(msg.into())
  }

  pub fn provider(msg: impl Into<String>) -> Self {
    GameError::ProviderFailure(msg.into())
  }

  /// Stable machine-readable tag for clients.
  pub fn kind(&self) -> &'static str {
    match self {
      GameError::InvalidArgument(_) => "invalid_argument",
      GameError::InvalidOperation(_) => "invalid_operation",
      GameError::ProviderFailure(_) => "provider_failure",
      GameError::UnknownSession(_) => "unknown_session",
    }
  }
}
