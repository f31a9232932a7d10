//! Contracts of the remote services the session talks to.
//!
//! The session only sees these traits, so tests can drive it with fakes and
//! the HTTP implementation stays a thin wrapper.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::AnalysisRecord;
use crate::query::SearchParams;

pub mod contract;
pub mod http;

pub use contract::{ExtractedContent, Extraction, HealthReport};
pub use http::HttpServiceClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisService: Send + Sync {
  /// `POST /analyze`
  async fn analyze(&self, text: &str) -> Result<AnalysisRecord>;

  /// `GET /search`; topic/keyword matching happens remotely
  async fn search(&self, params: &SearchParams) -> Result<Vec<AnalysisRecord>>;

  /// `GET /analyses`
  async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionService: Send + Sync {
  /// `POST /extract-url`. A reported failure is `Ok(Extraction::Failed)`;
  /// `Err` is reserved for transport and protocol problems.
  async fn extract_url(&self, url: &str) -> Result<Extraction>;
}
