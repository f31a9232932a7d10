//! Submission pipeline: validate input and start the analysis or extraction
//! request behind it.
//!
//! The pipeline hands out `'static` futures that own their service handles,
//! so the session can keep several submissions in flight while it stays
//! free to mutate its own state.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{DistillError, Result};
use crate::model::AnalysisRecord;
use crate::service::{AnalysisService, ExtractedContent, ExtractionService};

/// Which step of a submission is currently running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPhase {
  #[default]
  Idle,
  Extracting,
  Analyzing,
}

#[derive(Clone)]
pub struct SubmissionPipeline {
  analysis: Arc<dyn AnalysisService>,
  extraction: Arc<dyn ExtractionService>,
}

impl SubmissionPipeline {
  pub fn new(analysis: Arc<dyn AnalysisService>, extraction: Arc<dyn ExtractionService>) -> Self {
    Self { analysis, extraction }
  }

  /// Trimmed text, or a validation error when nothing is left.
  pub fn prepare_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
      return Err(DistillError::validation("Text cannot be empty"));
    }
    Ok(text.to_string())
  }

  /// Parse a user-supplied URL. A missing scheme means `https://`.
  pub fn prepare_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Err(DistillError::validation("URL cannot be empty"));
    }

    let candidate =
      if raw.contains("://") { raw.to_string() } else { format!("https://{raw}") };
    let url = Url::parse(&candidate)
      .map_err(|e| DistillError::validation(format!("Invalid URL '{raw}': {e}")))?;

    match url.scheme() {
      "http" | "https" if url.host_str().is_some() => Ok(url),
      "http" | "https" => {
        Err(DistillError::validation(format!("Invalid URL '{raw}': missing host")))
      }
      scheme => Err(DistillError::validation(format!(
        "Invalid URL '{raw}': unsupported scheme {scheme}, expected http or https"
      ))),
    }
  }

  /// Send already prepared text to the analysis service.
  pub fn analyze(&self, text: String) -> BoxFuture<'static, Result<AnalysisRecord>> {
    let analysis = Arc::clone(&self.analysis);
    async move {
      debug!(chars = text.chars().count(), "submitting text for analysis");
      analysis.analyze(&text).await
    }
    .boxed()
  }

  /// Ask the extraction service for the page content. A reported failure
  /// becomes an `ExtractionContent` error.
  pub fn extract(&self, url: Url) -> BoxFuture<'static, Result<ExtractedContent>> {
    let extraction = Arc::clone(&self.extraction);
    async move {
      debug!(url = %url, "extracting content");
      extraction.extract_url(url.as_str()).await?.into_content()
    }
    .boxed()
  }
}

impl std::fmt::Debug for SubmissionPipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubmissionPipeline").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{parse_timestamp, Sentiment};
  use crate::service::{Extraction, MockAnalysisService, MockExtractionService};

  fn record(id: &str) -> AnalysisRecord {
    AnalysisRecord {
      id: id.to_string(),
      summary: "A short summary".to_string(),
      title: None,
      sentiment: Sentiment::Positive,
      topics: vec!["testing".to_string()],
      keywords: Vec::new(),
      phrases: Vec::new(),
      entities: None,
      confidence_score: 0.9,
      metrics: None,
      created_at: parse_timestamp("2024-03-01T09:30:00").unwrap(),
    }
  }

  fn pipeline(
    analysis: MockAnalysisService,
    extraction: MockExtractionService,
  ) -> SubmissionPipeline {
    SubmissionPipeline::new(Arc::new(analysis), Arc::new(extraction))
  }

  #[test]
  fn test_prepare_text_trims_and_rejects_blank() {
    assert_eq!(SubmissionPipeline::prepare_text("  hello world \n").unwrap(), "hello world");
    assert!(SubmissionPipeline::prepare_text("   \t").unwrap_err().is_validation());
  }

  #[test]
  fn test_prepare_url_defaults_to_https() {
    let url = SubmissionPipeline::prepare_url("example.com/post").unwrap();
    assert_eq!(url.as_str(), "https://example.com/post");

    let url = SubmissionPipeline::prepare_url(" http://x.test ").unwrap();
    assert_eq!(url.scheme(), "http");
  }

  #[test]
  fn test_prepare_url_rejects_bad_input() {
    assert!(SubmissionPipeline::prepare_url("").unwrap_err().is_validation());
    assert!(SubmissionPipeline::prepare_url("ftp://files.test").unwrap_err().is_validation());
    assert!(SubmissionPipeline::prepare_url("https://").unwrap_err().is_validation());
  }

  #[tokio::test]
  async fn test_analyze_sends_prepared_text() {
    let mut analysis = MockAnalysisService::new();
    analysis
      .expect_analyze()
      .withf(|text| text == "Rust is great")
      .times(1)
      .returning(|_| Ok(record("a1")));

    let pipeline = pipeline(analysis, MockExtractionService::new());
    let result = pipeline.analyze("Rust is great".to_string()).await.unwrap();
    assert_eq!(result.id, "a1");
  }

  #[tokio::test]
  async fn test_extract_returns_content() {
    let mut extraction = MockExtractionService::new();
    extraction.expect_extract_url().withf(|url| url == "https://x.test/").times(1).returning(|_| {
      Ok(Extraction::Extracted(ExtractedContent {
        content: "Page body".to_string(),
        title: Some("Page".to_string()),
        word_count: Some(2),
        source_url: None,
      }))
    });

    let pipeline = pipeline(MockAnalysisService::new(), extraction);
    let url = SubmissionPipeline::prepare_url("https://x.test").unwrap();
    let content = pipeline.extract(url).await.unwrap();
    assert_eq!(content.content, "Page body");
  }

  #[tokio::test]
  async fn test_reported_extraction_failure_surfaces_message() {
    let mut extraction = MockExtractionService::new();
    extraction
      .expect_extract_url()
      .returning(|_| Ok(Extraction::Failed { error: Some("blocked".to_string()) }));

    let pipeline = pipeline(MockAnalysisService::new(), extraction);
    let url = SubmissionPipeline::prepare_url("https://x.test").unwrap();
    let err = pipeline.extract(url).await.unwrap_err();
    assert_eq!(err.category(), crate::error::FailureCategory::ExtractionContent);
    assert_eq!(err.to_string(), "blocked");
  }
}
