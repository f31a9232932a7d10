//! Request and response bodies of the analysis and extraction services.

use serde::{Deserialize, Serialize};

use crate::error::{DistillError, Result};
use crate::model::AnalysisRecord;

pub const EXTRACTION_FALLBACK_ERROR: &str = "Failed to extract content from URL";

/// Body of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
  pub text: String,
}

/// Body of `GET /analyses` and `GET /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysesResponse {
  pub analyses: Vec<AnalysisRecord>,
}

/// Body of `POST /extract-url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractUrlRequest {
  pub url: String,
}

/// Raw `POST /extract-url` response. Only ever consumed through
/// [`Extraction`], which decides success from the payload itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResponse {
  pub success: bool,
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub word_count: Option<u64>,
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
  pub content: String,
  pub title: Option<String>,
  pub word_count: Option<u64>,
  pub source_url: Option<String>,
}

/// Outcome reported by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
  Extracted(ExtractedContent),
  Failed { error: Option<String> },
}

impl From<ExtractionResponse> for Extraction {
  fn from(response: ExtractionResponse) -> Self {
    let content = response.content.filter(|content| !content.trim().is_empty());
    match (response.success, content) {
      (true, Some(content)) => Extraction::Extracted(ExtractedContent {
        content,
        title: response.title,
        word_count: response.word_count,
        source_url: response.url,
      }),
      _ => Extraction::Failed { error: response.error.filter(|e| !e.trim().is_empty()) },
    }
  }
}

impl Extraction {
  pub fn into_content(self) -> Result<ExtractedContent> {
    match self {
      Extraction::Extracted(content) => Ok(content),
      Extraction::Failed { error } => Err(DistillError::extraction_content(
        error.unwrap_or_else(|| EXTRACTION_FALLBACK_ERROR.to_string()),
      )),
    }
  }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
  pub status: String,
  #[serde(default)]
  pub database: Option<String>,
  #[serde(default)]
  pub llm: Option<String>,
}

/// FastAPI-style error body: `{"detail": "..."}` or a list of validation
/// problems.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
  #[serde(default)]
  pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
  pub(crate) fn message(&self) -> Option<String> {
    match self.detail.as_ref()? {
      serde_json::Value::String(detail) => Some(detail.clone()),
      serde_json::Value::Null => None,
      other => Some(other.to_string()),
    }
  }
}
