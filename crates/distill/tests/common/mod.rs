#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use distill::error::Result;
use distill::model::{AnalysisRecord, Sentiment};
use distill::query::SearchParams;
use distill::service::{AnalysisService, ExtractedContent, Extraction, ExtractionService};
use distill::{AnalysisSession, DistillError, StaleResponsePolicy};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a record created `day` days after 2024-01-01.
pub fn record(id: &str, sentiment: Sentiment, day: i64, topics: &[&str]) -> AnalysisRecord {
  let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
  AnalysisRecord {
    id: id.to_string(),
    summary: format!("Summary for {id}"),
    title: Some(format!("Record {id}")),
    sentiment,
    topics: topics.iter().map(|t| t.to_string()).collect(),
    keywords: topics.iter().map(|t| format!("{t}-kw")).collect(),
    phrases: Vec::new(),
    entities: None,
    confidence_score: 0.8,
    metrics: None,
    created_at: base + Duration::days(day),
  }
}

pub fn ids(records: &[AnalysisRecord]) -> Vec<&str> {
  records.iter().map(|r| r.id.as_str()).collect()
}

/// In-memory stand-in for both remote services. It behaves like a tiny
/// server: analyses are stored and later returned by list and search.
pub struct FakeService {
  pub server_records: Mutex<Vec<AnalysisRecord>>,
  pub extraction: Mutex<Extraction>,
  pub next_sentiment: Mutex<Sentiment>,
  pub fail_list: AtomicBool,
  pub fail_analyze: AtomicBool,
  pub fail_search: AtomicBool,
  pub list_calls: AtomicUsize,
  pub analyze_calls: AtomicUsize,
  pub search_calls: AtomicUsize,
  pub extract_calls: AtomicUsize,
  pub analyzed_texts: Mutex<Vec<String>>,
}

impl Default for FakeService {
  fn default() -> Self {
    Self::new()
  }
}

impl FakeService {
  pub fn new() -> Self {
    Self {
      server_records: Mutex::new(Vec::new()),
      extraction: Mutex::new(Extraction::Failed { error: None }),
      next_sentiment: Mutex::new(Sentiment::Positive),
      fail_list: AtomicBool::new(false),
      fail_analyze: AtomicBool::new(false),
      fail_search: AtomicBool::new(false),
      list_calls: AtomicUsize::new(0),
      analyze_calls: AtomicUsize::new(0),
      search_calls: AtomicUsize::new(0),
      extract_calls: AtomicUsize::new(0),
      analyzed_texts: Mutex::new(Vec::new()),
    }
  }

  pub fn with_records(records: Vec<AnalysisRecord>) -> Arc<Self> {
    let fake = Self::new();
    *fake.server_records.lock().unwrap() = records;
    Arc::new(fake)
  }

  pub fn push_server_record(&self, record: AnalysisRecord) {
    self.server_records.lock().unwrap().insert(0, record);
  }

  pub fn set_extraction(&self, extraction: Extraction) {
    *self.extraction.lock().unwrap() = extraction;
  }

  pub fn extract_succeeds_with(&self, content: &str) {
    self.set_extraction(Extraction::Extracted(ExtractedContent {
      content: content.to_string(),
      title: Some("Fetched page".to_string()),
      word_count: Some(content.split_whitespace().count() as u64),
      source_url: None,
    }));
  }

  pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl AnalysisService for FakeService {
  async fn analyze(&self, text: &str) -> Result<AnalysisRecord> {
    let n = self.analyze_calls.fetch_add(1, Ordering::SeqCst) + 1;
    self.analyzed_texts.lock().unwrap().push(text.to_string());
    if self.fail_analyze.load(Ordering::SeqCst) {
      return Err(DistillError::service("/analyze", 500, "Analysis failed: model offline"));
    }

    let sentiment = *self.next_sentiment.lock().unwrap();
    let mut created = record(&format!("submitted-{n}"), sentiment, 100 + n as i64, &["submitted"]);
    created.summary = text.chars().take(40).collect();
    self.push_server_record(created.clone());
    Ok(created)
  }

  async fn search(&self, params: &SearchParams) -> Result<Vec<AnalysisRecord>> {
    self.search_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_search.load(Ordering::SeqCst) {
      return Err(DistillError::network("connection reset"));
    }

    let topic = params.topic.as_deref().map(str::to_lowercase);
    let keyword = params.keyword.as_deref().map(str::to_lowercase);
    let records = self.server_records.lock().unwrap();
    Ok(
      records
        .iter()
        .filter(|r| {
          topic.as_ref().map_or(true, |t| r.topics.iter().any(|x| x.to_lowercase() == *t))
            && keyword.as_ref().map_or(true, |k| r.keywords.iter().any(|x| x.to_lowercase() == *k))
        })
        .cloned()
        .collect(),
    )
  }

  async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_list.load(Ordering::SeqCst) {
      return Err(DistillError::network("connection refused"));
    }
    Ok(self.server_records.lock().unwrap().clone())
  }
}

#[async_trait]
impl ExtractionService for FakeService {
  async fn extract_url(&self, _url: &str) -> Result<Extraction> {
    self.extract_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.extraction.lock().unwrap().clone())
  }
}

pub fn session_with(fake: &Arc<FakeService>) -> AnalysisSession {
  let analysis: Arc<dyn AnalysisService> = fake.clone();
  let extraction: Arc<dyn ExtractionService> = fake.clone();
  AnalysisSession::new(analysis, extraction)
}

pub fn discarding_session(fake: &Arc<FakeService>) -> AnalysisSession {
  session_with(fake).with_policy(StaleResponsePolicy::Discard)
}
