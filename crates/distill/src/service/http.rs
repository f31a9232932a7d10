//! HTTP client for the analysis and extraction services
//!
//! A thin reqwest wrapper: every call is logged, bounded by the configured
//! timeout and decoded into the validated contract types.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::contract::{
  AnalysesResponse, AnalyzeRequest, ErrorBody, ExtractUrlRequest, Extraction, ExtractionResponse,
  HealthReport,
};
use super::{AnalysisService, ExtractionService};
use crate::config::Config;
use crate::error::{DistillError, Result};
use crate::model::AnalysisRecord;
use crate::query::SearchParams;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP method types for REST API calls
#[derive(Debug, Copy, Clone)]
enum HttpMethod {
  Get,
  Post,
}

impl std::fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let method_str = match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
    };
    write!(f, "{method_str}")
  }
}

#[derive(Debug, Clone)]
pub struct HttpServiceClient {
  client: Client,
  api_base: Url,
  extractor_base: Url,
  timeout: Duration,
}

fn endpoint_url(base: &Url, path: &str) -> String {
  format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

/// Best human-readable message for a non-success response body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
  if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
    if let Some(message) = parsed.message() {
      return message;
    }
  }
  let body = body.trim();
  if body.is_empty() {
    status.canonical_reason().unwrap_or("request failed").to_string()
  } else {
    body.chars().take(200).collect()
  }
}

/// Helpers to handle HTTP response parsing and error handling
async fn parse_response<R>(response: Response, path: &str) -> Result<R>
where
  R: DeserializeOwned,
{
  let status = response.status();
  let body = response.text().await.map_err(|e| DistillError::from_transport(path, e))?;

  if !status.is_success() {
    return Err(DistillError::service(path, status.as_u16(), error_message(&body, status)));
  }

  serde_json::from_str(&body).map_err(|e| DistillError::malformed(path, e.to_string()))
}

// Client Constructor
// ==================
impl HttpServiceClient {
  pub fn new(config: &Config) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout())
      .build()
      .map_err(|e| DistillError::config(format!("failed to create HTTP client: {e}")))?;

    Ok(Self {
      client,
      api_base: config.api_base()?,
      extractor_base: config.extractor_base()?,
      timeout: config.timeout(),
    })
  }

  pub fn api_base(&self) -> &Url {
    &self.api_base
  }
}

// Client Methods
// ==============
impl HttpServiceClient {
  async fn send(
    &self,
    method: HttpMethod,
    path: &str,
    request: RequestBuilder,
    limit: Duration,
  ) -> Result<Response> {
    debug!("{method} {path}");
    let response = timeout(limit, request.send())
      .await
      .map_err(|_| {
        warn!("{method} {path} timed out after {}s", limit.as_secs());
        DistillError::network(format!("{method} {path} timed out after {}s", limit.as_secs()))
      })?
      .map_err(|e| {
        warn!("{method} {path} failed: {e}");
        DistillError::from_transport(path, e)
      })?;
    debug!(status = response.status().as_u16(), "{method} {path} responded");
    Ok(response)
  }

  async fn get_json<R>(&self, path: &str, query: Option<&SearchParams>) -> Result<R>
  where
    R: DeserializeOwned,
  {
    let mut request = self.client.get(endpoint_url(&self.api_base, path));
    if let Some(query) = query {
      request = request.query(query);
    }
    let response = self.send(HttpMethod::Get, path, request, self.timeout).await?;
    parse_response(response, path).await
  }

  /// Check that the analysis service is reachable and report its
  /// dependencies.
  pub async fn health(&self) -> Result<HealthReport> {
    let path = "/health";
    let request = self.client.get(endpoint_url(&self.api_base, path));
    let response = self.send(HttpMethod::Get, path, request, HEALTH_TIMEOUT).await?;
    parse_response(response, path).await
  }
}

#[async_trait]
impl AnalysisService for HttpServiceClient {
  async fn analyze(&self, text: &str) -> Result<AnalysisRecord> {
    let path = "/analyze";
    let body = AnalyzeRequest { text: text.to_string() };
    let request = self.client.post(endpoint_url(&self.api_base, path)).json(&body);
    let response = self.send(HttpMethod::Post, path, request, self.timeout).await?;
    let record: AnalysisRecord = parse_response(response, path).await?;
    info!(id = %record.id, sentiment = %record.sentiment, "analysis completed");
    Ok(record)
  }

  async fn search(&self, params: &SearchParams) -> Result<Vec<AnalysisRecord>> {
    let response: AnalysesResponse = self.get_json("/search", Some(params)).await?;
    info!("found {} analyses", response.analyses.len());
    Ok(response.analyses)
  }

  async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>> {
    let response: AnalysesResponse = self.get_json("/analyses", None).await?;
    info!("retrieved {} analyses", response.analyses.len());
    Ok(response.analyses)
  }
}

#[async_trait]
impl ExtractionService for HttpServiceClient {
  async fn extract_url(&self, url: &str) -> Result<Extraction> {
    let path = "/extract-url";
    let body = ExtractUrlRequest { url: url.to_string() };
    let request = self.client.post(endpoint_url(&self.extractor_base, path)).json(&body);
    let response = self.send(HttpMethod::Post, path, request, self.timeout).await?;

    let status = response.status();
    let text = response.text().await.map_err(|e| DistillError::from_transport(path, e))?;

    // The payload decides success; an error status with a readable payload
    // still carries the extractor's own message.
    match serde_json::from_str::<ExtractionResponse>(&text) {
      Ok(payload) => {
        let extraction = Extraction::from(payload);
        if !status.is_success() && matches!(extraction, Extraction::Extracted(_)) {
          return Err(DistillError::service(path, status.as_u16(), error_message(&text, status)));
        }
        Ok(extraction)
      }
      Err(_) if !status.is_success() => {
        Err(DistillError::service(path, status.as_u16(), error_message(&text, status)))
      }
      Err(e) => Err(DistillError::malformed(path, e.to_string())),
    }
  }
}
