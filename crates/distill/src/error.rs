//! Error taxonomy shared by the service clients, the submission pipeline and
//! the session coordinator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DistillError>;

#[derive(Error, Debug)]
pub enum DistillError {
  #[error("Network failure: {message}")]
  Network { message: String },

  #[error("{endpoint} returned HTTP {status}: {message}")]
  Service { endpoint: String, status: u16, message: String },

  #[error("Malformed response from {endpoint}: {message}")]
  MalformedResponse { endpoint: String, message: String },

  #[error("{message}")]
  Validation { message: String },

  #[error("{message}")]
  ExtractionContent { message: String },

  #[error("Configuration error: {message}")]
  Config { message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Failure classes the presentation layer distinguishes. `Setup` covers
/// configuration problems that happen before any session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
  Network,
  Service,
  Validation,
  ExtractionContent,
  Setup,
}

impl DistillError {
  pub fn network(message: impl Into<String>) -> Self {
    Self::Network { message: message.into() }
  }

  pub fn service(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
    Self::Service { endpoint: endpoint.into(), status, message: message.into() }
  }

  pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
    Self::MalformedResponse { endpoint: endpoint.into(), message: message.into() }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation { message: message.into() }
  }

  pub fn extraction_content(message: impl Into<String>) -> Self {
    Self::ExtractionContent { message: message.into() }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }

  pub fn category(&self) -> FailureCategory {
    match self {
      Self::Network { .. } => FailureCategory::Network,
      Self::Service { .. } | Self::MalformedResponse { .. } => FailureCategory::Service,
      Self::Validation { .. } => FailureCategory::Validation,
      Self::ExtractionContent { .. } => FailureCategory::ExtractionContent,
      Self::Config { .. } | Self::Io(_) => FailureCategory::Setup,
    }
  }

  pub fn is_validation(&self) -> bool {
    self.category() == FailureCategory::Validation
  }

  /// Classify a reqwest failure raised while talking to `endpoint`.
  pub fn from_transport(endpoint: &str, err: reqwest::Error) -> Self {
    if err.is_decode() {
      Self::malformed(endpoint, err.to_string())
    } else if err.is_timeout() {
      Self::network(format!("request to {endpoint} timed out"))
    } else if let Some(status) = err.status() {
      Self::service(endpoint, status.as_u16(), err.to_string())
    } else {
      Self::network(format!("{endpoint}: {err}"))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_categories() {
    assert_eq!(DistillError::network("down").category(), FailureCategory::Network);
    assert_eq!(DistillError::service("/analyze", 500, "boom").category(), FailureCategory::Service);
    assert_eq!(DistillError::malformed("/analyses", "bad").category(), FailureCategory::Service);
    assert_eq!(
      DistillError::extraction_content("blocked").category(),
      FailureCategory::ExtractionContent
    );
    assert!(DistillError::validation("empty").is_validation());
    assert_eq!(DistillError::config("nope").category(), FailureCategory::Setup);
  }

  #[test]
  fn test_extraction_message_is_verbatim() {
    let err = DistillError::extraction_content("blocked by robots.txt");
    assert_eq!(err.to_string(), "blocked by robots.txt");
  }

  #[test]
  fn test_service_message_names_endpoint() {
    let err = DistillError::service("/analyze", 503, "Analysis failed: upstream");
    assert_eq!(err.to_string(), "/analyze returned HTTP 503: Analysis failed: upstream");
  }
}
