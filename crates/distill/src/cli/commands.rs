use anyhow::{anyhow, Result};
use colored::*;
use serde::Serialize;
use std::io::Write;

use super::display::{
  phase_message, render_dashboard, render_details, render_health, render_record_card,
  render_record_list,
};
use super::OutputFormat;
use crate::error::DistillError;
use crate::model::AnalysisRecord;
use crate::query::SearchParams;
use crate::service::HttpServiceClient;
use crate::session::AnalysisSession;

/// Turn a failed operation into the message the session recorded for it.
/// Validation failures never reach the session, so they keep their own text.
pub fn surfaced(session: &AnalysisSession, err: DistillError) -> anyhow::Error {
  if err.is_validation() {
    return anyhow!(err);
  }
  match session.error() {
    Some(message) => anyhow!(message.to_string()),
    None => anyhow!(err),
  }
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
  writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
  Ok(())
}

fn print_phase(
  session: &AnalysisSession,
  out: &mut impl Write,
  format: OutputFormat,
) -> Result<()> {
  if format == OutputFormat::Pretty {
    if let Some(message) = phase_message(session.submission_phase()) {
      writeln!(out, "{} {}", "…".cyan(), message.dimmed())?;
    }
  }
  Ok(())
}

fn print_record(out: &mut impl Write, record: &AnalysisRecord, format: OutputFormat) -> Result<()> {
  match format {
    OutputFormat::Json => print_json(out, record),
    OutputFormat::Pretty => {
      writeln!(out, "{} Analysis complete", "✓".green())?;
      write!(out, "{}", render_record_card(None, record))?;
      Ok(())
    }
  }
}

/// Submit text for analysis and print the new record.
pub async fn analyze(
  session: &mut AnalysisSession,
  text: &str,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  let pending = session.begin_submit_text(text).map_err(|e| surfaced(session, e))?;
  print_phase(session, out, format)?;
  let settled = pending.resolve().await;
  let record = session.finish_submit(settled).map_err(|e| surfaced(session, e))?;
  print_record(out, &record, format)
}

/// Extract a page, then analyze its content, reporting each phase.
pub async fn extract(
  session: &mut AnalysisSession,
  url: &str,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  let pending = session.begin_submit_url(url).map_err(|e| surfaced(session, e))?;
  print_phase(session, out, format)?;
  let extracted = pending.resolve().await;

  let pending = session.finish_extraction(extracted).map_err(|e| surfaced(session, e))?;
  print_phase(session, out, format)?;
  let analyzed = pending.resolve().await;

  let record = session.finish_submit(analyzed).map_err(|e| surfaced(session, e))?;
  print_record(out, &record, format)
}

/// Print whatever the session currently displays.
pub fn print_displayed(
  session: &AnalysisSession,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  match format {
    OutputFormat::Json => print_json(out, &session.view()),
    OutputFormat::Pretty => {
      write!(out, "{}", render_record_list(session.displayed_records()))?;
      Ok(())
    }
  }
}

pub fn print_stats(
  session: &AnalysisSession,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  match format {
    OutputFormat::Json => print_json(out, &session.analytics()),
    OutputFormat::Pretty => {
      write!(out, "{}", render_dashboard(&session.analytics()))?;
      Ok(())
    }
  }
}

pub async fn list(
  session: &mut AnalysisSession,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  session.refresh().await.map_err(|e| surfaced(session, e))?;
  if format == OutputFormat::Pretty {
    writeln!(out, "{}", render_dashboard(&session.analytics()))?;
  }
  print_displayed(session, format, out)
}

pub async fn stats(
  session: &mut AnalysisSession,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  session.refresh().await.map_err(|e| surfaced(session, e))?;
  print_stats(session, format, out)
}

pub async fn search(
  session: &mut AnalysisSession,
  params: &SearchParams,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  match session.search(params).await.map_err(|e| surfaced(session, e))? {
    Some(count) => {
      if format == OutputFormat::Pretty {
        writeln!(out, "{} {} matching analyses\n", "🔍".cyan(), count.to_string().bold())?;
      }
      print_displayed(session, format, out)
    }
    None if format == OutputFormat::Json => print_displayed(session, format, out),
    None => {
      writeln!(out, "{}", "Nothing to search for: give a topic or a keyword.".yellow())?;
      Ok(())
    }
  }
}

/// Refresh, then show the first record with `id`.
pub async fn show(
  session: &mut AnalysisSession,
  id: &str,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  session.refresh().await.map_err(|e| surfaced(session, e))?;
  let record = session
    .find_displayed(id)
    .cloned()
    .ok_or_else(|| anyhow!("No analysis with id '{id}'"))?;
  session.view_details(record);
  print_selected(session, format, out)
}

pub fn print_selected(
  session: &AnalysisSession,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  let Some(record) = session.selected_record() else {
    return Ok(());
  };
  match format {
    OutputFormat::Json => print_json(out, record),
    OutputFormat::Pretty => {
      write!(out, "{}", render_details(record))?;
      Ok(())
    }
  }
}

pub async fn health(
  client: &HttpServiceClient,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()> {
  let report = client.health().await?;
  match format {
    OutputFormat::Json => print_json(out, &report),
    OutputFormat::Pretty => {
      write!(out, "{}", render_health(&report))?;
      Ok(())
    }
  }
}
