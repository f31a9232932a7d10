//! The "all analyses" collection.

use crate::analytics::AnalyticsSnapshot;
use crate::model::AnalysisRecord;

/// Ordered record collection, newest submissions first.
///
/// Duplicate ids are kept as separate entries: a refresh that overlaps a
/// submission may legitimately return the same record twice.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
  records: Vec<AnalysisRecord>,
  analytics: AnalyticsSnapshot,
}

impl RecordStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn replace_all(&mut self, records: Vec<AnalysisRecord>) {
    self.records = records;
    self.recompute();
  }

  pub fn prepend(&mut self, record: AnalysisRecord) {
    self.records.insert(0, record);
    self.recompute();
  }

  pub fn all(&self) -> &[AnalysisRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn find(&self, id: &str) -> Option<&AnalysisRecord> {
    self.records.iter().find(|record| record.id == id)
  }

  pub fn analytics(&self) -> AnalyticsSnapshot {
    self.analytics
  }

  fn recompute(&mut self) {
    self.analytics = AnalyticsSnapshot::compute(&self.records);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{parse_timestamp, Sentiment};

  fn record(id: &str, sentiment: Sentiment) -> AnalysisRecord {
    AnalysisRecord {
      id: id.to_string(),
      summary: "summary".to_string(),
      title: Some(format!("Record {id}")),
      sentiment,
      topics: vec!["ai".to_string()],
      keywords: Vec::new(),
      phrases: Vec::new(),
      entities: None,
      confidence_score: 0.7,
      metrics: None,
      created_at: parse_timestamp("2024-02-01T12:00:00Z").unwrap(),
    }
  }

  #[test]
  fn test_prepend_puts_newest_first() {
    let mut store = RecordStore::new();
    store.prepend(record("old", Sentiment::Neutral));
    store.prepend(record("new", Sentiment::Positive));

    let ids: Vec<_> = store.all().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(store.analytics().total, 2);
    assert_eq!(store.analytics().positive, 1);
  }

  #[test]
  fn test_replace_all_recomputes_analytics() {
    let mut store = RecordStore::new();
    store.prepend(record("gone", Sentiment::Negative));
    store.replace_all(vec![record("a", Sentiment::Positive), record("b", Sentiment::Positive)]);

    assert_eq!(store.len(), 2);
    assert!(store.find("gone").is_none());
    assert_eq!(store.analytics().negative, 0);
    assert_eq!(store.analytics().positive, 2);

    store.replace_all(Vec::new());
    assert!(store.is_empty());
    assert_eq!(store.analytics(), AnalyticsSnapshot::default());
  }

  #[test]
  fn test_duplicates_are_not_collapsed() {
    let mut store = RecordStore::new();
    store.replace_all(vec![record("dup", Sentiment::Neutral)]);
    store.prepend(record("dup", Sentiment::Neutral));

    assert_eq!(store.len(), 2);
    assert_eq!(store.analytics().neutral, 2);
    assert_eq!(store.find("dup").map(|r| r.id.as_str()), Some("dup"));
  }
}
