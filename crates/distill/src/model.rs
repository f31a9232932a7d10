//! Analysis records as returned by the analysis service.
//!
//! Records are validated while they are deserialized: a response that
//! violates the record contract never reaches the session state.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const UNTITLED: &str = "Untitled Analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Sentiment {
  Positive,
  Neutral,
  Negative,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sentiment '{0}', expected positive, neutral or negative")]
pub struct ParseSentimentError(String);

impl Sentiment {
  /// Display and grouping order.
  pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

  pub fn as_str(&self) -> &'static str {
    match self {
      Sentiment::Positive => "positive",
      Sentiment::Neutral => "neutral",
      Sentiment::Negative => "negative",
    }
  }

  pub fn emoji(&self) -> &'static str {
    match self {
      Sentiment::Positive => "😊",
      Sentiment::Neutral => "😐",
      Sentiment::Negative => "😞",
    }
  }

  pub(crate) fn group_rank(&self) -> u8 {
    match self {
      Sentiment::Positive => 0,
      Sentiment::Neutral => 1,
      Sentiment::Negative => 2,
    }
  }
}

impl fmt::Display for Sentiment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Sentiment {
  type Err = ParseSentimentError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "positive" => Ok(Sentiment::Positive),
      "neutral" => Ok(Sentiment::Neutral),
      "negative" => Ok(Sentiment::Negative),
      _ => Err(ParseSentimentError(s.to_string())),
    }
  }
}

impl TryFrom<String> for Sentiment {
  type Error = ParseSentimentError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// Named entities grouped by kind. Present in full or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entities {
  pub people: Vec<String>,
  pub organizations: Vec<String>,
  pub locations: Vec<String>,
  /// Labelled entities that fit none of the groups, e.g. "2024 (DATE)".
  #[serde(rename = "entities", skip_serializing_if = "Vec::is_empty")]
  pub other: Vec<String>,
}

impl Entities {
  pub fn is_empty(&self) -> bool {
    self.people.is_empty()
      && self.organizations.is_empty()
      && self.locations.is_empty()
      && self.other.is_empty()
  }
}

/// Readability statistics; the service computes all three in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextMetrics {
  pub readability_score: f64,
  pub word_count: u64,
  pub sentence_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnalysisRecord")]
pub struct AnalysisRecord {
  pub id: String,
  pub summary: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  pub sentiment: Sentiment,
  pub topics: Vec<String>,
  pub keywords: Vec<String>,
  pub phrases: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub entities: Option<Entities>,
  pub confidence_score: f64,
  #[serde(flatten)]
  pub metrics: Option<TextMetrics>,
  pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
  pub fn display_title(&self) -> &str {
    self.title.as_deref().unwrap_or(UNTITLED)
  }

  pub fn confidence_percent(&self) -> u8 {
    (self.confidence_score * 100.0).round() as u8
  }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid analysis record '{}': {reason}", .id.as_deref().unwrap_or("<no id>"))]
pub struct InvalidRecord {
  pub id: Option<String>,
  pub reason: String,
}

impl InvalidRecord {
  fn new(id: &str, reason: impl Into<String>) -> Self {
    let id = if id.trim().is_empty() { None } else { Some(id.to_string()) };
    Self { id, reason: reason.into() }
  }
}

/// Wire shape of a record, before contract checks.
#[derive(Debug, Deserialize)]
struct RawAnalysisRecord {
  id: String,
  summary: String,
  #[serde(default)]
  title: Option<String>,
  sentiment: Sentiment,
  #[serde(default)]
  topics: Option<Vec<String>>,
  #[serde(default)]
  keywords: Option<Vec<String>>,
  #[serde(default)]
  phrases: Option<Vec<String>>,
  #[serde(default)]
  entities: Option<RawEntities>,
  confidence_score: f64,
  #[serde(default)]
  readability_score: Option<f64>,
  #[serde(default)]
  word_count: Option<u64>,
  #[serde(default)]
  sentence_count: Option<u64>,
  #[serde(deserialize_with = "deserialize_timestamp")]
  created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
  #[serde(default)]
  people: Option<Vec<String>>,
  #[serde(default)]
  organizations: Option<Vec<String>>,
  #[serde(default)]
  locations: Option<Vec<String>>,
  #[serde(default, rename = "entities")]
  other: Option<Vec<String>>,
}

impl TryFrom<RawAnalysisRecord> for AnalysisRecord {
  type Error = InvalidRecord;

  fn try_from(raw: RawAnalysisRecord) -> Result<Self, Self::Error> {
    if raw.id.trim().is_empty() {
      return Err(InvalidRecord::new(&raw.id, "id is empty"));
    }
    if raw.summary.trim().is_empty() {
      return Err(InvalidRecord::new(&raw.id, "summary is empty"));
    }
    if !(0.0..=1.0).contains(&raw.confidence_score) {
      return Err(InvalidRecord::new(
        &raw.id,
        format!("confidence_score {} is outside [0, 1]", raw.confidence_score),
      ));
    }

    let metrics = match (raw.readability_score, raw.word_count, raw.sentence_count) {
      (None, None, None) => None,
      (Some(readability_score), Some(word_count), Some(sentence_count)) => {
        if !readability_score.is_finite() || readability_score < 0.0 {
          return Err(InvalidRecord::new(
            &raw.id,
            format!("readability_score {readability_score} is not a non-negative number"),
          ));
        }
        Some(TextMetrics { readability_score, word_count, sentence_count })
      }
      _ => {
        return Err(InvalidRecord::new(
          &raw.id,
          "readability_score, word_count and sentence_count must be present together",
        ))
      }
    };

    let entities = match raw.entities {
      None => None,
      Some(RawEntities { people: None, organizations: None, locations: None, .. }) => None,
      Some(RawEntities {
        people: Some(people),
        organizations: Some(organizations),
        locations: Some(locations),
        other,
      }) => Some(Entities { people, organizations, locations, other: other.unwrap_or_default() }),
      Some(_) => {
        return Err(InvalidRecord::new(
          &raw.id,
          "entities must carry people, organizations and locations together",
        ))
      }
    };

    let title = raw.title.filter(|t| !t.trim().is_empty());

    Ok(Self {
      id: raw.id,
      summary: raw.summary,
      title,
      sentiment: raw.sentiment,
      topics: raw.topics.unwrap_or_default(),
      keywords: raw.keywords.unwrap_or_default(),
      phrases: raw.phrases.unwrap_or_default(),
      entities,
      confidence_score: raw.confidence_score,
      metrics,
      created_at: raw.created_at,
    })
  }
}

/// Parse the timestamp formats the analysis service is known to emit.
///
/// Offset-less date-times are produced by `utcnow().isoformat()` upstream and
/// are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
    return Some(parsed.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse_timestamp(&raw)
    .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'")))
}
