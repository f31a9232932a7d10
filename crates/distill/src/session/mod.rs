//! The analysis session: owner of all client-side state.
//!
//! Every intent is split in two. `begin_*` performs the synchronous state
//! transition and hands back a [`Pending`] operation; `finish_*` applies its
//! [`Settled`] result. The async helpers at the bottom drive both halves for
//! callers that only ever run one operation at a time.

use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analytics::AnalyticsSnapshot;
use crate::config::StaleResponsePolicy;
use crate::error::{DistillError, FailureCategory, Result};
use crate::model::AnalysisRecord;
use crate::pipeline::{SubmissionPhase, SubmissionPipeline};
use crate::query::{select, AnalysisQuery, SearchParams};
use crate::service::{AnalysisService, ExtractedContent, ExtractionService, HttpServiceClient};
use crate::store::RecordStore;

pub mod operation;

pub use operation::{OperationKind, OperationState, OperationTracker, Pending, Settled, Ticket};

const REFRESH_FAILED: &str = "Failed to load analyses";
const ANALYZE_FAILED: &str = "Failed to analyze text";
const SEARCH_FAILED: &str = "Failed to search analyses";
const EXTRACT_FAILED: &str = "Failed to extract content from URL";

/// Records returned for a search, already filtered and ordered locally.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
  pub query: AnalysisQuery,
  pub records: Vec<AnalysisRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchView {
  #[default]
  Inactive,
  Results { query: AnalysisQuery, records: Vec<AnalysisRecord> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
  Inactive,
  Pending,
  ResultsEmpty,
  ResultsNonEmpty,
}

/// Everything the presentation layer observes, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
  pub displayed_records: Vec<AnalysisRecord>,
  pub analytics: AnalyticsSnapshot,
  pub loading: bool,
  pub is_searching: bool,
  pub submission_phase: SubmissionPhase,
  pub search_status: SearchStatus,
  pub error: Option<String>,
  pub selected_record: Option<AnalysisRecord>,
}

#[derive(Debug, Default)]
struct Trackers {
  refresh: OperationTracker,
  analyze: OperationTracker,
  extract: OperationTracker,
  search: OperationTracker,
}

impl Trackers {
  fn get_mut(&mut self, kind: OperationKind) -> &mut OperationTracker {
    match kind {
      OperationKind::Refresh => &mut self.refresh,
      OperationKind::Analyze => &mut self.analyze,
      OperationKind::Extract => &mut self.extract,
      OperationKind::Search => &mut self.search,
    }
  }
}

pub struct AnalysisSession {
  analysis: Arc<dyn AnalysisService>,
  pipeline: SubmissionPipeline,
  policy: StaleResponsePolicy,
  store: RecordStore,
  search: SearchView,
  trackers: Trackers,
  error: Option<String>,
  selected: Option<AnalysisRecord>,
}

// Construction
// ============
impl AnalysisSession {
  pub fn new(analysis: Arc<dyn AnalysisService>, extraction: Arc<dyn ExtractionService>) -> Self {
    Self {
      pipeline: SubmissionPipeline::new(Arc::clone(&analysis), extraction),
      analysis,
      policy: StaleResponsePolicy::default(),
      store: RecordStore::new(),
      search: SearchView::Inactive,
      trackers: Trackers::default(),
      error: None,
      selected: None,
    }
  }

  pub fn with_policy(mut self, policy: StaleResponsePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// One HTTP client serves both contracts.
  pub fn from_client(client: Arc<HttpServiceClient>) -> Self {
    let analysis: Arc<dyn AnalysisService> = client.clone();
    let extraction: Arc<dyn ExtractionService> = client;
    Self::new(analysis, extraction)
  }
}

// Intents
// =======
impl AnalysisSession {
  fn start(&mut self, kind: OperationKind) -> Ticket {
    self.error = None;
    let generation = self.trackers.get_mut(kind).start();
    debug!(%kind, generation, "operation started");
    Ticket { kind, generation }
  }

  /// Settle a ticket; `false` means the response must be dropped.
  fn settle(&mut self, ticket: Ticket) -> bool {
    let current = self.trackers.get_mut(ticket.kind).settle(ticket.generation);
    if current || self.policy == StaleResponsePolicy::Apply {
      return true;
    }
    debug!(kind = %ticket.kind, generation = ticket.generation, "discarding stale response");
    false
  }

  fn fail(&mut self, headline: &str, err: &DistillError) {
    let message = match err.category() {
      FailureCategory::ExtractionContent => err.to_string(),
      _ => format!("{headline}: {err}"),
    };
    warn!("{message}");
    self.error = Some(message);
  }

  pub fn begin_refresh(&mut self) -> Pending<Vec<AnalysisRecord>> {
    let ticket = self.start(OperationKind::Refresh);
    let analysis = Arc::clone(&self.analysis);
    Pending::new(ticket, async move { analysis.list_analyses().await }.boxed())
  }

  /// Apply a refresh. `Ok(None)` means the response was stale and dropped.
  pub fn finish_refresh(&mut self, settled: Settled<Vec<AnalysisRecord>>) -> Result<Option<usize>> {
    let (ticket, result) = settled.into_parts();
    if !self.settle(ticket) {
      return Ok(None);
    }
    match result {
      Ok(records) => {
        info!("loaded {} analyses", records.len());
        self.store.replace_all(records);
        Ok(Some(self.store.len()))
      }
      Err(err) => {
        self.fail(REFRESH_FAILED, &err);
        Err(err)
      }
    }
  }

  /// Start analyzing `text`. Blank text is rejected without touching state.
  pub fn begin_submit_text(&mut self, text: &str) -> Result<Pending<AnalysisRecord>> {
    let text = SubmissionPipeline::prepare_text(text)?;
    Ok(self.start_analysis(text))
  }

  fn start_analysis(&mut self, text: String) -> Pending<AnalysisRecord> {
    let ticket = self.start(OperationKind::Analyze);
    Pending::new(ticket, self.pipeline.analyze(text))
  }

  pub fn finish_submit(&mut self, settled: Settled<AnalysisRecord>) -> Result<AnalysisRecord> {
    let (ticket, result) = settled.into_parts();
    self.settle(ticket);
    match result {
      Ok(record) => {
        info!(id = %record.id, "analysis added");
        self.store.prepend(record.clone());
        Ok(record)
      }
      Err(err) => {
        self.fail(ANALYZE_FAILED, &err);
        Err(err)
      }
    }
  }

  /// Start the extraction half of a URL submission.
  pub fn begin_submit_url(&mut self, url: &str) -> Result<Pending<ExtractedContent>> {
    let url = SubmissionPipeline::prepare_url(url)?;
    let ticket = self.start(OperationKind::Extract);
    Ok(Pending::new(ticket, self.pipeline.extract(url)))
  }

  /// Apply an extraction and, when it produced content, start analyzing it.
  pub fn finish_extraction(
    &mut self,
    settled: Settled<ExtractedContent>,
  ) -> Result<Pending<AnalysisRecord>> {
    let (ticket, result) = settled.into_parts();
    self.settle(ticket);
    let extracted = match result {
      Ok(extracted) => extracted,
      Err(err) => {
        self.fail(EXTRACT_FAILED, &err);
        return Err(err);
      }
    };

    info!(
      url = extracted.source_url.as_deref().unwrap_or("-"),
      title = extracted.title.as_deref().unwrap_or("-"),
      words = extracted.word_count.unwrap_or_default(),
      "content extracted"
    );
    match SubmissionPipeline::prepare_text(&extracted.content) {
      Ok(text) => Ok(self.start_analysis(text)),
      Err(_) => {
        let err = DistillError::extraction_content(EXTRACT_FAILED);
        self.fail(EXTRACT_FAILED, &err);
        Err(err)
      }
    }
  }

  /// Start a search. A query without a term is a no-op: nothing is sent and
  /// `None` comes back.
  pub fn begin_search(&mut self, query: AnalysisQuery) -> Option<Pending<SearchResults>> {
    if !query.has_term() {
      debug!("search without a term ignored");
      return None;
    }

    let ticket = self.start(OperationKind::Search);
    let analysis = Arc::clone(&self.analysis);
    let future = async move {
      let found = analysis.search(&query.to_params()).await?;
      let records = select(&found, &query);
      Ok(SearchResults { query, records })
    };
    Some(Pending::new(ticket, future.boxed()))
  }

  /// Apply a search. `Ok(None)` means the response was stale and dropped.
  pub fn finish_search(&mut self, settled: Settled<SearchResults>) -> Result<Option<usize>> {
    let (ticket, result) = settled.into_parts();
    if !self.settle(ticket) {
      return Ok(None);
    }
    match result {
      Ok(SearchResults { query, records }) => {
        let count = records.len();
        info!("search matched {count} analyses");
        self.search = SearchView::Results { query, records };
        Ok(Some(count))
      }
      Err(err) => {
        self.fail(SEARCH_FAILED, &err);
        Err(err)
      }
    }
  }

  /// Return the display to the full collection.
  pub fn clear_search(&mut self) {
    self.search = SearchView::Inactive;
    if self.policy == StaleResponsePolicy::Discard {
      self.trackers.search.invalidate();
    }
  }

  pub fn view_details(&mut self, record: AnalysisRecord) {
    self.selected = Some(record);
  }

  pub fn close_details(&mut self) {
    self.selected = None;
  }

  /// Give up on a started operation without applying anything.
  pub fn abandon<T>(&mut self, pending: Pending<T>) {
    let ticket = pending.ticket();
    debug!(kind = %ticket.kind, generation = ticket.generation, "operation abandoned");
    self.trackers.get_mut(ticket.kind).settle(ticket.generation);
  }
}

// Derived state
// =============
impl AnalysisSession {
  /// The search results while a search view is active, even when empty,
  /// otherwise the whole collection.
  pub fn displayed_records(&self) -> &[AnalysisRecord] {
    match &self.search {
      SearchView::Results { records, .. } => records,
      SearchView::Inactive => self.store.all(),
    }
  }

  pub fn find_displayed(&self, id: &str) -> Option<&AnalysisRecord> {
    self.displayed_records().iter().find(|record| record.id == id)
  }

  pub fn analytics(&self) -> AnalyticsSnapshot {
    self.store.analytics()
  }

  pub fn is_loading(&self) -> bool {
    self.trackers.refresh.is_pending()
      || self.trackers.analyze.is_pending()
      || self.trackers.extract.is_pending()
  }

  pub fn is_searching(&self) -> bool {
    self.trackers.search.is_pending()
  }

  pub fn submission_phase(&self) -> SubmissionPhase {
    if self.trackers.extract.is_pending() {
      SubmissionPhase::Extracting
    } else if self.trackers.analyze.is_pending() {
      SubmissionPhase::Analyzing
    } else {
      SubmissionPhase::Idle
    }
  }

  pub fn search_status(&self) -> SearchStatus {
    if self.is_searching() {
      return SearchStatus::Pending;
    }
    match &self.search {
      SearchView::Inactive => SearchStatus::Inactive,
      SearchView::Results { records, .. } if records.is_empty() => SearchStatus::ResultsEmpty,
      SearchView::Results { .. } => SearchStatus::ResultsNonEmpty,
    }
  }

  pub fn search_view(&self) -> &SearchView {
    &self.search
  }

  pub fn operation_state(&self, kind: OperationKind) -> OperationState {
    match kind {
      OperationKind::Refresh => self.trackers.refresh.state(),
      OperationKind::Analyze => self.trackers.analyze.state(),
      OperationKind::Extract => self.trackers.extract.state(),
      OperationKind::Search => self.trackers.search.state(),
    }
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn selected_record(&self) -> Option<&AnalysisRecord> {
    self.selected.as_ref()
  }

  pub fn store(&self) -> &RecordStore {
    &self.store
  }

  pub fn view(&self) -> SessionView {
    SessionView {
      displayed_records: self.displayed_records().to_vec(),
      analytics: self.analytics(),
      loading: self.is_loading(),
      is_searching: self.is_searching(),
      submission_phase: self.submission_phase(),
      search_status: self.search_status(),
      error: self.error.clone(),
      selected_record: self.selected.clone(),
    }
  }
}

// Sequential drivers
// ==================
impl AnalysisSession {
  /// Reload the collection; returns the number of stored records.
  pub async fn refresh(&mut self) -> Result<usize> {
    let settled = self.begin_refresh().resolve().await;
    self.finish_refresh(settled)?;
    Ok(self.store.len())
  }

  pub async fn submit_text(&mut self, text: &str) -> Result<AnalysisRecord> {
    let settled = self.begin_submit_text(text)?.resolve().await;
    self.finish_submit(settled)
  }

  /// Extract, then analyze. Analysis never starts when extraction failed.
  pub async fn submit_url(&mut self, url: &str) -> Result<AnalysisRecord> {
    let extracted = self.begin_submit_url(url)?.resolve().await;
    let analyzed = self.finish_extraction(extracted)?.resolve().await;
    self.finish_submit(analyzed)
  }

  /// Validate raw parameters and search. `Ok(None)` when the query has no
  /// term or its response was discarded.
  pub async fn search(&mut self, params: &SearchParams) -> Result<Option<usize>> {
    let query = AnalysisQuery::from_params(params)?;
    match self.begin_search(query) {
      Some(pending) => {
        let settled = pending.resolve().await;
        self.finish_search(settled)
      }
      None => Ok(None),
    }
  }
}

impl std::fmt::Debug for AnalysisSession {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnalysisSession")
      .field("policy", &self.policy)
      .field("store", &self.store)
      .field("search", &self.search)
      .field("trackers", &self.trackers)
      .field("error", &self.error)
      .finish_non_exhaustive()
  }
}
