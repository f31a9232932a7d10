//! Sentiment totals over the record collection.

use serde::Serialize;

use crate::model::{AnalysisRecord, Sentiment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
  pub total: usize,
  pub positive: usize,
  pub negative: usize,
  pub neutral: usize,
}

impl AnalyticsSnapshot {
  /// Recount from scratch; the snapshot is never updated incrementally.
  pub fn compute(records: &[AnalysisRecord]) -> Self {
    records.iter().fold(Self::default(), |mut snapshot, record| {
      snapshot.total += 1;
      match record.sentiment {
        Sentiment::Positive => snapshot.positive += 1,
        Sentiment::Negative => snapshot.negative += 1,
        Sentiment::Neutral => snapshot.neutral += 1,
      }
      snapshot
    })
  }

  pub fn count(&self, sentiment: Sentiment) -> usize {
    match sentiment {
      Sentiment::Positive => self.positive,
      Sentiment::Neutral => self.neutral,
      Sentiment::Negative => self.negative,
    }
  }

  /// Share of `sentiment` in percent, rounded; 0 for an empty collection.
  pub fn share(&self, sentiment: Sentiment) -> u8 {
    if self.total == 0 {
      return 0;
    }
    ((self.count(sentiment) as f64 / self.total as f64) * 100.0).round() as u8
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn record(id: &str, sentiment: Sentiment) -> AnalysisRecord {
    AnalysisRecord {
      id: id.to_string(),
      summary: "summary".to_string(),
      title: None,
      sentiment,
      topics: Vec::new(),
      keywords: Vec::new(),
      phrases: Vec::new(),
      entities: None,
      confidence_score: 0.5,
      metrics: None,
      created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn test_empty_collection() {
    let snapshot = AnalyticsSnapshot::compute(&[]);
    assert_eq!(snapshot, AnalyticsSnapshot { total: 0, positive: 0, negative: 0, neutral: 0 });
    assert_eq!(snapshot.share(Sentiment::Positive), 0);
  }

  #[test]
  fn test_counts_sum_to_total() {
    let sentiments = [
      Sentiment::Positive,
      Sentiment::Negative,
      Sentiment::Neutral,
      Sentiment::Positive,
      Sentiment::Positive,
      Sentiment::Neutral,
    ];
    for len in 0..=sentiments.len() {
      let records: Vec<_> =
        sentiments[..len].iter().enumerate().map(|(i, s)| record(&i.to_string(), *s)).collect();
      let snapshot = AnalyticsSnapshot::compute(&records);
      assert_eq!(snapshot.positive + snapshot.negative + snapshot.neutral, snapshot.total);
      assert_eq!(snapshot.total, len);
    }
  }

  #[test]
  fn test_duplicate_ids_are_counted_separately() {
    let records = vec![record("same", Sentiment::Negative), record("same", Sentiment::Negative)];
    assert_eq!(AnalyticsSnapshot::compute(&records).negative, 2);
  }

  #[test]
  fn test_shares_round() {
    let records = vec![
      record("1", Sentiment::Positive),
      record("2", Sentiment::Negative),
      record("3", Sentiment::Negative),
    ];
    let snapshot = AnalyticsSnapshot::compute(&records);
    assert_eq!(snapshot.share(Sentiment::Positive), 33);
    assert_eq!(snapshot.share(Sentiment::Negative), 67);
    assert_eq!(snapshot.share(Sentiment::Neutral), 0);
  }
}
