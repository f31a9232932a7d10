use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use distill::cli::{commands, shell, OutputFormat};
use distill::model::Sentiment;
use distill::query::{SearchParams, SortOrder};
use distill::service::HttpServiceClient;
use distill::{logging, AnalysisSession, Config};

#[derive(Parser)]
#[command(name = "distill")]
#[command(about = "Distill - submit text or web pages for analysis and browse the insights")]
#[command(version)]
struct Cli {
  /// Path to a YAML config file
  #[arg(long, global = true, env = "DISTILL_CONFIG")]
  config: Option<PathBuf>,

  /// Base URL of the analysis service
  #[arg(long, global = true)]
  api_url: Option<String>,

  /// Base URL of the extraction service
  #[arg(long, global = true)]
  extractor_url: Option<String>,

  /// Request timeout in seconds
  #[arg(long, global = true)]
  timeout: Option<u64>,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
  format: OutputFormat,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Analyze a piece of text
  Analyze {
    /// Text to analyze
    #[arg(required_unless_present = "file")]
    text: Vec<String>,
    /// Read the text from a file instead
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,
  },
  /// Extract the content of a web page and analyze it
  Extract {
    /// Page URL; https is assumed when no scheme is given
    url: String,
  },
  /// List all analyses with the sentiment dashboard
  List,
  /// Search analyses by topic or keyword
  Search {
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    keyword: Option<String>,
    /// Only keep analyses with this sentiment
    #[arg(long)]
    sentiment: Option<Sentiment>,
    /// newest, oldest or sentiment
    #[arg(long)]
    sort: Option<SortOrder>,
  },
  /// Show the details of one analysis
  Show {
    /// Analysis id
    id: String,
  },
  /// Show sentiment statistics
  Stats,
  /// Check that the analysis service is up
  Health,
  /// Start an interactive session
  Shell,
}

fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(api_url) = &cli.api_url {
    config.api_url = api_url.clone();
  }
  if let Some(extractor_url) = &cli.extractor_url {
    config.extractor_url = Some(extractor_url.clone());
  }
  if let Some(timeout) = cli.timeout {
    config.timeout_secs = timeout;
  }
  config.validate()?;
  debug!(api_url = %config.api_url, timeout_secs = config.timeout_secs, "configuration loaded");
  Ok(config)
}

#[cfg(not(tarpaulin_include))]
async fn handle(command: Command, config: &Config, format: OutputFormat) -> Result<()> {
  let client = Arc::new(HttpServiceClient::new(config)?);
  let mut session =
    AnalysisSession::from_client(Arc::clone(&client)).with_policy(config.stale_responses);
  let mut out = std::io::stdout().lock();

  match command {
    Command::Analyze { text, file } => {
      let text = match file {
        Some(path) => std::fs::read_to_string(&path)
          .with_context(|| format!("Failed to read {}", path.display()))?,
        None => text.join(" "),
      };
      commands::analyze(&mut session, &text, format, &mut out).await?
    }
    Command::Extract { url } => commands::extract(&mut session, &url, format, &mut out).await?,
    Command::List => commands::list(&mut session, format, &mut out).await?,
    Command::Search { topic, keyword, sentiment, sort } => {
      let params = SearchParams { topic, keyword, sentiment, sort_by: sort };
      commands::search(&mut session, &params, format, &mut out).await?
    }
    Command::Show { id } => commands::show(&mut session, &id, format, &mut out).await?,
    Command::Stats => commands::stats(&mut session, format, &mut out).await?,
    Command::Health => commands::health(&client, format, &mut out).await?,
    Command::Shell => {
      let stdin = tokio::io::BufReader::new(tokio::io::stdin());
      shell::run(&mut session, stdin, format, &mut out).await?
    }
  }

  out.flush()?;
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let config = load_config(&cli)?;
  let format = cli.format;
  handle(cli.command, &config, format).await
}
