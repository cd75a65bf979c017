//! Step error types.

/// Errors a step can raise instead of returning a value.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
  /// A configured field is missing or malformed.
  #[error("invalid input '{field}': {message}")]
  InvalidInput { field: String, message: String },

  /// The step ran and reports failure.
  #[error("{0}")]
  Failed(String),

  /// An outbound HTTP call failed before a response was received.
  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),
}

impl StepError {
  pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::InvalidInput {
      field: field.into(),
      message: message.into(),
    }
  }
}
