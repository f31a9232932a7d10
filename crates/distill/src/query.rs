//! Search queries and the local filter/sort applied to their results.
//!
//! Topic and keyword matching happens on the analysis service. Locally a
//! query only filters by sentiment and orders the records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::{DistillError, Result};
use crate::model::{AnalysisRecord, Sentiment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Newest,
  Oldest,
  Sentiment,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort order '{0}', expected newest, oldest or sentiment")]
pub struct ParseSortOrderError(String);

impl SortOrder {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortOrder::Newest => "newest",
      SortOrder::Oldest => "oldest",
      SortOrder::Sentiment => "sentiment",
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortOrder {
  type Err = ParseSortOrderError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "newest" => Ok(SortOrder::Newest),
      "oldest" => Ok(SortOrder::Oldest),
      "sentiment" => Ok(SortOrder::Sentiment),
      _ => Err(ParseSortOrderError(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
  Topic(String),
  Keyword(String),
}

impl SearchTerm {
  pub fn value(&self) -> &str {
    match self {
      SearchTerm::Topic(value) | SearchTerm::Keyword(value) => value,
    }
  }

  pub fn field(&self) -> &'static str {
    match self {
      SearchTerm::Topic(_) => "topic",
      SearchTerm::Keyword(_) => "keyword",
    }
  }
}

impl fmt::Display for SearchTerm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} \"{}\"", self.field(), self.value())
  }
}

/// Query parameters of `GET /search` exactly as they travel on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub topic: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub keyword: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sentiment: Option<Sentiment>,
  #[serde(default, rename = "sortBy", skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<SortOrder>,
}

/// A validated query: at most one search term, an optional sentiment filter
/// and a sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisQuery {
  pub term: Option<SearchTerm>,
  pub sentiment: Option<Sentiment>,
  pub sort_by: SortOrder,
}

fn non_blank(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl AnalysisQuery {
  pub fn topic(value: &str) -> Self {
    Self { term: non_blank(Some(value)).map(SearchTerm::Topic), ..Self::default() }
  }

  pub fn keyword(value: &str) -> Self {
    Self { term: non_blank(Some(value)).map(SearchTerm::Keyword), ..Self::default() }
  }

  pub fn with_sentiment(mut self, sentiment: Option<Sentiment>) -> Self {
    self.sentiment = sentiment;
    self
  }

  pub fn sorted_by(mut self, sort_by: SortOrder) -> Self {
    self.sort_by = sort_by;
    self
  }

  /// Validate raw parameters. Blank values count as unset; a topic and a
  /// keyword together are rejected.
  pub fn from_params(params: &SearchParams) -> Result<Self> {
    let topic = non_blank(params.topic.as_deref());
    let keyword = non_blank(params.keyword.as_deref());

    let term = match (topic, keyword) {
      (Some(_), Some(_)) => {
        return Err(DistillError::validation("search by topic or by keyword, not both"))
      }
      (Some(topic), None) => Some(SearchTerm::Topic(topic)),
      (None, Some(keyword)) => Some(SearchTerm::Keyword(keyword)),
      (None, None) => None,
    };

    Ok(Self { term, sentiment: params.sentiment, sort_by: params.sort_by.unwrap_or_default() })
  }

  pub fn to_params(&self) -> SearchParams {
    let (topic, keyword) = match &self.term {
      Some(SearchTerm::Topic(value)) => (Some(value.clone()), None),
      Some(SearchTerm::Keyword(value)) => (None, Some(value.clone())),
      None => (None, None),
    };
    SearchParams { topic, keyword, sentiment: self.sentiment, sort_by: Some(self.sort_by) }
  }

  pub fn has_term(&self) -> bool {
    self.term.is_some()
  }

  pub fn matches(&self, record: &AnalysisRecord) -> bool {
    self.sentiment.map_or(true, |wanted| record.sentiment == wanted)
  }
}

/// Filter by the query's sentiment and order by its sort mode.
pub fn select(records: &[AnalysisRecord], query: &AnalysisQuery) -> Vec<AnalysisRecord> {
  let mut selected: Vec<AnalysisRecord> =
    records.iter().filter(|record| query.matches(record)).cloned().collect();
  sort_records(&mut selected, query.sort_by);
  selected
}

/// Stable sort: records with equal keys keep their relative order.
pub fn sort_records(records: &mut [AnalysisRecord], order: SortOrder) {
  match order {
    SortOrder::Newest => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    SortOrder::Oldest => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    SortOrder::Sentiment => records.sort_by(|a, b| {
      a.sentiment
        .group_rank()
        .cmp(&b.sentiment.group_rank())
        .then_with(|| b.created_at.cmp(&a.created_at))
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::parse_timestamp;

  fn record(id: &str, sentiment: Sentiment, created_at: &str) -> AnalysisRecord {
    AnalysisRecord {
      id: id.to_string(),
      summary: format!("summary {id}"),
      title: None,
      sentiment,
      topics: Vec::new(),
      keywords: Vec::new(),
      phrases: Vec::new(),
      entities: None,
      confidence_score: 0.9,
      metrics: None,
      created_at: parse_timestamp(created_at).unwrap(),
    }
  }

  fn ids(records: &[AnalysisRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
  }

  #[test]
  fn test_oldest_orders_ascending() {
    let records = vec![
      record("jan1", Sentiment::Neutral, "2024-01-01"),
      record("jan3", Sentiment::Neutral, "2024-01-03"),
      record("jan2", Sentiment::Neutral, "2024-01-02"),
    ];
    let query = AnalysisQuery::default().sorted_by(SortOrder::Oldest);
    assert_eq!(ids(&select(&records, &query)), vec!["jan1", "jan2", "jan3"]);
  }

  #[test]
  fn test_newest_is_idempotent() {
    let records = vec![
      record("a", Sentiment::Positive, "2024-01-02"),
      record("b", Sentiment::Negative, "2024-01-05"),
      record("c", Sentiment::Neutral, "2024-01-02"),
      record("d", Sentiment::Neutral, "2024-01-01"),
    ];
    let query = AnalysisQuery::default();
    let once = select(&records, &query);
    let twice = select(&once, &query);
    assert_eq!(ids(&once), vec!["b", "a", "c", "d"]);
    assert_eq!(once, twice);
  }

  #[test]
  fn test_ties_keep_original_order() {
    let records = vec![
      record("first", Sentiment::Positive, "2024-01-01"),
      record("second", Sentiment::Positive, "2024-01-01"),
      record("third", Sentiment::Positive, "2024-01-01"),
    ];
    for order in [SortOrder::Newest, SortOrder::Oldest, SortOrder::Sentiment] {
      let query = AnalysisQuery::default().sorted_by(order);
      assert_eq!(ids(&select(&records, &query)), vec!["first", "second", "third"]);
    }
  }

  #[test]
  fn test_sentiment_groups_then_newest_first() {
    let records = vec![
      record("neg-old", Sentiment::Negative, "2024-01-01"),
      record("pos-old", Sentiment::Positive, "2024-01-01"),
      record("neu", Sentiment::Neutral, "2024-01-04"),
      record("pos-new", Sentiment::Positive, "2024-01-03"),
      record("neg-new", Sentiment::Negative, "2024-01-05"),
    ];
    let query = AnalysisQuery::default().sorted_by(SortOrder::Sentiment);
    assert_eq!(
      ids(&select(&records, &query)),
      vec!["pos-new", "pos-old", "neu", "neg-new", "neg-old"]
    );
  }

  #[test]
  fn test_sentiment_filter() {
    let records = vec![
      record("a", Sentiment::Positive, "2024-01-01"),
      record("b", Sentiment::Negative, "2024-01-02"),
      record("c", Sentiment::Positive, "2024-01-03"),
    ];
    let query = AnalysisQuery::topic("ai").with_sentiment(Some(Sentiment::Positive));
    assert_eq!(ids(&select(&records, &query)), vec!["c", "a"]);
  }

  #[test]
  fn test_topic_and_keyword_together_are_rejected() {
    let params = SearchParams {
      topic: Some("ai".to_string()),
      keyword: Some("ml".to_string()),
      ..SearchParams::default()
    };
    let err = AnalysisQuery::from_params(&params).unwrap_err();
    assert!(err.is_validation());
  }

  #[test]
  fn test_blank_values_count_as_unset() {
    let params = SearchParams {
      topic: Some("  ai ".to_string()),
      keyword: Some("   ".to_string()),
      ..SearchParams::default()
    };
    let query = AnalysisQuery::from_params(&params).unwrap();
    assert_eq!(query.term, Some(SearchTerm::Topic("ai".to_string())));

    assert!(!AnalysisQuery::keyword("  ").has_term());
  }

  #[test]
  fn test_params_round_trip_through_wire_names() {
    let query = AnalysisQuery::keyword("rust")
      .with_sentiment(Some(Sentiment::Neutral))
      .sorted_by(SortOrder::Sentiment);
    let json = serde_json::to_value(query.to_params()).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "keyword": "rust", "sentiment": "neutral", "sortBy": "sentiment" })
    );
  }

  #[test]
  fn test_sort_order_parsing() {
    assert_eq!("Oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
    assert!("random".parse::<SortOrder>().is_err());
    assert_eq!(SortOrder::default(), SortOrder::Newest);
  }
}
