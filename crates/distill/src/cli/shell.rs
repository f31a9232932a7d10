//! Interactive shell: one session, many commands.

use anyhow::Result;
use colored::*;
use std::io::Write;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::commands;
use super::display::render_error;
use super::OutputFormat;
use crate::model::{AnalysisRecord, Sentiment};
use crate::query::{SearchParams, SortOrder};
use crate::session::{AnalysisSession, SearchView};

const HELP: &str = "\
Commands:
  refresh                                   reload all analyses
  analyze <text>                            analyze a piece of text
  url <url>                                 extract a page and analyze it
  search topic|keyword <term> [sentiment=S] [sort=newest|oldest|sentiment]
  clear                                     leave the search view
  list                                      show the displayed analyses
  show <n|id>                               show details of an analysis
  close                                     close the details view
  stats                                     sentiment dashboard
  help                                      this text
  quit                                      leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
  Empty,
  Refresh,
  Analyze(String),
  Url(String),
  Search(SearchParams),
  Clear,
  List,
  Show(String),
  Close,
  Stats,
  Help,
  Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellParseError {
  #[error("unknown command '{0}', type 'help' for a list")]
  UnknownCommand(String),
  #[error("usage: {0}")]
  Usage(&'static str),
  #[error("{0}")]
  InvalidOption(String),
}

impl ShellCommand {
  pub fn parse(line: &str) -> std::result::Result<Self, ShellParseError> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
      Some((command, rest)) => (command, rest.trim()),
      None => (line, ""),
    };

    match command.to_lowercase().as_str() {
      "" => Ok(ShellCommand::Empty),
      "refresh" | "r" => Ok(ShellCommand::Refresh),
      "analyze" | "a" => Ok(ShellCommand::Analyze(rest.to_string())),
      "url" | "u" => Ok(ShellCommand::Url(rest.to_string())),
      "search" | "s" => parse_search(rest).map(ShellCommand::Search),
      "clear" => Ok(ShellCommand::Clear),
      "list" | "ls" => Ok(ShellCommand::List),
      "show" => {
        if rest.is_empty() {
          return Err(ShellParseError::Usage("show <n|id>"));
        }
        Ok(ShellCommand::Show(rest.to_string()))
      }
      "close" => Ok(ShellCommand::Close),
      "stats" => Ok(ShellCommand::Stats),
      "help" | "?" => Ok(ShellCommand::Help),
      "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
      other => Err(ShellParseError::UnknownCommand(other.to_string())),
    }
  }
}

fn parse_search(rest: &str) -> std::result::Result<SearchParams, ShellParseError> {
  const USAGE: &str = "search topic|keyword <term> [sentiment=S] [sort=O]";

  let mut words = rest.split_whitespace();
  let field = words.next().ok_or(ShellParseError::Usage(USAGE))?;

  let mut params = SearchParams::default();
  let mut term = Vec::new();
  for word in words {
    if let Some(value) = word.strip_prefix("sentiment=") {
      let sentiment = value
        .parse::<Sentiment>()
        .map_err(|e| ShellParseError::InvalidOption(e.to_string()))?;
      params.sentiment = Some(sentiment);
    } else if let Some(value) = word.strip_prefix("sort=") {
      let sort = value
        .parse::<SortOrder>()
        .map_err(|e| ShellParseError::InvalidOption(e.to_string()))?;
      params.sort_by = Some(sort);
    } else {
      term.push(word);
    }
  }

  let term = term.join(" ");
  match field.to_lowercase().as_str() {
    "topic" => params.topic = Some(term),
    "keyword" => params.keyword = Some(term),
    _ => return Err(ShellParseError::Usage(USAGE)),
  }
  Ok(params)
}

/// Resolve `show` targets: a 1-based position in the displayed list, or an
/// id.
fn show_target(session: &AnalysisSession, target: &str) -> Option<AnalysisRecord> {
  let displayed = session.displayed_records();
  if let Ok(position) = target.parse::<usize>() {
    if let Some(record) = position.checked_sub(1).and_then(|index| displayed.get(index)) {
      return Some(record.clone());
    }
  }
  session.find_displayed(target).cloned()
}

fn prompt(session: &AnalysisSession) -> String {
  let label = match session.search_view() {
    SearchView::Results { .. } => "distill (search)",
    SearchView::Inactive => "distill",
  };
  format!("{}> ", label.cyan())
}

/// Run one command. Returns `false` when the shell should stop.
pub async fn execute(
  session: &mut AnalysisSession,
  command: ShellCommand,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<bool> {
  match command {
    ShellCommand::Empty => {}
    ShellCommand::Quit => return Ok(false),
    ShellCommand::Help => writeln!(out, "{HELP}")?,
    ShellCommand::Refresh => {
      let count = session.refresh().await.map_err(|e| commands::surfaced(session, e))?;
      writeln!(out, "{} Loaded {} analyses", "✓".green(), count)?;
    }
    ShellCommand::Analyze(text) => commands::analyze(session, &text, format, out).await?,
    ShellCommand::Url(url) => commands::extract(session, &url, format, out).await?,
    ShellCommand::Search(params) => commands::search(session, &params, format, out).await?,
    ShellCommand::Clear => {
      session.clear_search();
      writeln!(out, "Showing all {} analyses", session.displayed_records().len())?;
    }
    ShellCommand::List => commands::print_displayed(session, format, out)?,
    ShellCommand::Show(target) => match show_target(session, &target) {
      Some(record) => {
        session.view_details(record);
        commands::print_selected(session, format, out)?;
      }
      None => writeln!(out, "{}", render_error(&format!("No displayed analysis '{target}'")))?,
    },
    ShellCommand::Close => session.close_details(),
    ShellCommand::Stats => commands::print_stats(session, format, out)?,
  }
  Ok(true)
}

/// Read commands from `input` until it ends or `quit` is entered. Failed
/// commands are reported and the shell keeps going.
pub async fn run<R>(
  session: &mut AnalysisSession,
  input: R,
  format: OutputFormat,
  out: &mut impl Write,
) -> Result<()>
where
  R: AsyncBufRead + Unpin,
{
  writeln!(out, "{}", "distill shell, type 'help' for commands".dimmed())?;
  let mut lines = input.lines();

  loop {
    write!(out, "{}", prompt(session))?;
    out.flush()?;

    let Some(line) = lines.next_line().await? else {
      break;
    };

    let command = match ShellCommand::parse(&line) {
      Ok(command) => command,
      Err(e) => {
        writeln!(out, "{}", render_error(&e.to_string()))?;
        continue;
      }
    };

    match execute(session, command, format, out).await {
      Ok(true) => {}
      Ok(false) => break,
      Err(e) => writeln!(out, "{}", render_error(&e.to_string()))?,
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_simple_commands() {
    assert_eq!(ShellCommand::parse(""), Ok(ShellCommand::Empty));
    assert_eq!(ShellCommand::parse("  refresh "), Ok(ShellCommand::Refresh));
    assert_eq!(ShellCommand::parse("QUIT"), Ok(ShellCommand::Quit));
    assert_eq!(ShellCommand::parse("show 2"), Ok(ShellCommand::Show("2".to_string())));
    assert_eq!(
      ShellCommand::parse("analyze  The launch went well."),
      Ok(ShellCommand::Analyze("The launch went well.".to_string()))
    );
  }

  #[test]
  fn test_parse_search_with_options() {
    let command =
      ShellCommand::parse("search topic machine learning sentiment=positive sort=oldest");
    let expected = SearchParams {
      topic: Some("machine learning".to_string()),
      keyword: None,
      sentiment: Some(Sentiment::Positive),
      sort_by: Some(SortOrder::Oldest),
    };
    assert_eq!(command, Ok(ShellCommand::Search(expected)));
  }

  #[test]
  fn test_parse_errors() {
    assert!(matches!(ShellCommand::parse("dance"), Err(ShellParseError::UnknownCommand(_))));
    assert!(matches!(ShellCommand::parse("show"), Err(ShellParseError::Usage(_))));
    assert!(matches!(ShellCommand::parse("search colour red"), Err(ShellParseError::Usage(_))));
    assert!(matches!(
      ShellCommand::parse("search keyword rust sort=random"),
      Err(ShellParseError::InvalidOption(_))
    ));
  }

  #[test]
  fn test_analyze_without_text_parses_to_blank() {
    // Blank text is rejected later by the session, not by the parser.
    assert_eq!(ShellCommand::parse("analyze"), Ok(ShellCommand::Analyze(String::new())));
  }
}
