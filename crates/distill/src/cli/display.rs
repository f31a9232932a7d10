//! Display formatting utilities for CLI output
//!
//! Everything here renders to a `String`; printing is left to the callers.

use chrono::{DateTime, Utc};
use colored::*;

use crate::analytics::AnalyticsSnapshot;
use crate::model::{AnalysisRecord, Sentiment};
use crate::pipeline::SubmissionPhase;
use crate::service::HealthReport;

const CARD_WIDTH: usize = 76;
const BADGE_WIDTH: usize = 12;

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(current_line);
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

pub fn format_date(timestamp: &DateTime<Utc>) -> String {
  timestamp.format("%b %-d, %Y").to_string()
}

pub fn sentiment_badge(sentiment: Sentiment) -> String {
  paint_sentiment(sentiment, format!("{} {}", sentiment.emoji(), sentiment.as_str()))
}

/// Color after padding so escape codes never count toward the width.
fn padded_badge(sentiment: Sentiment) -> String {
  let label = format!("{} {}", sentiment.emoji(), sentiment.as_str());
  paint_sentiment(sentiment, format!("{label:<BADGE_WIDTH$}"))
}

fn paint_sentiment(sentiment: Sentiment, label: String) -> String {
  match sentiment {
    Sentiment::Positive => label.green().bold().to_string(),
    Sentiment::Neutral => label.yellow().bold().to_string(),
    Sentiment::Negative => label.red().bold().to_string(),
  }
}

fn indent(lines: Vec<String>, prefix: &str) -> String {
  lines.into_iter().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n")
}

fn tag_list(items: &[String]) -> String {
  items.iter().map(|item| format!("#{item}").cyan().to_string()).collect::<Vec<_>>().join(" ")
}

/// One-glance summary of a record as shown in lists.
pub fn render_record_card(position: Option<usize>, record: &AnalysisRecord) -> String {
  let mut out = String::new();

  let number = position.map(|n| format!("{:>3}. ", n + 1)).unwrap_or_default();
  out.push_str(&format!(
    "{}{}  {}\n",
    number.dimmed(),
    record.display_title().bold(),
    sentiment_badge(record.sentiment)
  ));

  let mut meta = vec![format_date(&record.created_at)];
  if let Some(metrics) = record.metrics {
    meta.push(format!("{} words", metrics.word_count));
    meta.push(format!("readability {:.1}", metrics.readability_score));
  }
  meta.push(format!("id {}", record.id));
  out.push_str(&format!("     {}\n", meta.join(" · ").dimmed()));

  out.push_str(&indent(wrap_text(&record.summary, CARD_WIDTH - 5), "     "));
  out.push('\n');

  if !record.topics.is_empty() {
    out.push_str(&format!("     {}\n", tag_list(&record.topics)));
  }
  out
}

/// Full view of one record.
pub fn render_details(record: &AnalysisRecord) -> String {
  let mut out = String::new();
  let header = format!("=== {} ===", record.display_title());
  out.push_str(&format!("{}\n", header.blue().bold()));
  out.push_str(&format!(
    "{}  {} confidence  {}\n\n",
    sentiment_badge(record.sentiment),
    format!("{}%", record.confidence_percent()).bold(),
    format_date(&record.created_at).dimmed()
  ));

  out.push_str(&format!("{}\n", "Summary".underline()));
  out.push_str(&indent(wrap_text(&record.summary, CARD_WIDTH), "  "));
  out.push_str("\n\n");

  if let Some(metrics) = record.metrics {
    out.push_str(&format!("{}\n", "Metrics".underline()));
    out.push_str(&format!(
      "  {} words, {} sentences, readability {:.1}\n\n",
      metrics.word_count, metrics.sentence_count, metrics.readability_score
    ));
  }

  if !record.topics.is_empty() {
    out.push_str(&format!("{}\n  {}\n\n", "Topics".underline(), tag_list(&record.topics)));
  }
  if !record.keywords.is_empty() {
    out.push_str(&format!("{}\n  {}\n\n", "Keywords".underline(), record.keywords.join(", ")));
  }
  if !record.phrases.is_empty() {
    out.push_str(&format!("{}\n", "Key phrases".underline()));
    for phrase in &record.phrases {
      out.push_str(&format!("  • {phrase}\n"));
    }
    out.push('\n');
  }

  if let Some(entities) = record.entities.as_ref().filter(|e| !e.is_empty()) {
    out.push_str(&format!("{}\n", "Entities".underline()));
    let groups = [
      ("People", &entities.people),
      ("Organizations", &entities.organizations),
      ("Locations", &entities.locations),
      ("Other", &entities.other),
    ];
    for (label, names) in groups {
      if !names.is_empty() {
        out.push_str(&format!("  {}: {}\n", label.bold(), names.join(", ")));
      }
    }
    out.push('\n');
  }

  out.push_str(&format!("{}\n", format!("id {}", record.id).dimmed()));
  out
}

pub fn render_dashboard(snapshot: &AnalyticsSnapshot) -> String {
  let mut out = format!("{} {} analyses\n", "📊".cyan(), snapshot.total.to_string().bold());
  for sentiment in Sentiment::ALL {
    out.push_str(&format!(
      "  {} {:>4}  {:>3}%\n",
      padded_badge(sentiment),
      snapshot.count(sentiment),
      snapshot.share(sentiment)
    ));
  }
  out
}

pub fn render_record_list(records: &[AnalysisRecord]) -> String {
  if records.is_empty() {
    return format!("{}\n", "No analyses to show.".dimmed());
  }
  records
    .iter()
    .enumerate()
    .map(|(n, record)| render_record_card(Some(n), record))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn phase_message(phase: SubmissionPhase) -> Option<&'static str> {
  match phase {
    SubmissionPhase::Idle => None,
    SubmissionPhase::Extracting => Some("Extracting content from URL..."),
    SubmissionPhase::Analyzing => Some("Analyzing text..."),
  }
}

pub fn render_error(message: &str) -> String {
  format!("{} {}", "✗".red(), message.red())
}

pub fn render_health(report: &HealthReport) -> String {
  let status = if report.status.eq_ignore_ascii_case("healthy") {
    report.status.green().bold()
  } else {
    report.status.yellow().bold()
  };
  let mut out = format!("status: {status}\n");
  if let Some(database) = &report.database {
    out.push_str(&format!("database: {database}\n"));
  }
  if let Some(llm) = &report.llm {
    out.push_str(&format!("llm: {llm}\n"));
  }
  out
}
