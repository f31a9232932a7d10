//! Configuration management for distill
//!
//! Values are layered: built-in defaults, then a YAML file, then `DISTILL_*`
//! environment variables. Command-line flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{DistillError, Result};

pub const ENV_API_URL: &str = "DISTILL_API_URL";
pub const ENV_EXTRACTOR_URL: &str = "DISTILL_EXTRACTOR_URL";
pub const ENV_TIMEOUT_SECS: &str = "DISTILL_TIMEOUT_SECS";
pub const ENV_STALE_RESPONSES: &str = "DISTILL_STALE_RESPONSES";

/// What to do with a refresh or search response that arrives after a newer
/// request of the same kind was issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResponsePolicy {
  /// Apply whatever arrives last.
  #[default]
  Apply,
  /// Drop responses superseded by a newer request.
  Discard,
}

impl FromStr for StaleResponsePolicy {
  type Err = DistillError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "apply" => Ok(StaleResponsePolicy::Apply),
      "discard" => Ok(StaleResponsePolicy::Discard),
      other => Err(DistillError::config(format!(
        "unknown stale response policy '{other}', expected apply or discard"
      ))),
    }
  }
}

impl fmt::Display for StaleResponsePolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StaleResponsePolicy::Apply => f.write_str("apply"),
      StaleResponsePolicy::Discard => f.write_str("discard"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Base URL of the analysis service
  pub api_url: String,
  /// Base URL of the extraction service; the analysis service when unset
  pub extractor_url: Option<String>,
  /// Transport timeout for every request
  pub timeout_secs: u64,
  pub stale_responses: StaleResponsePolicy,
}

fn default_api_url() -> String {
  "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      extractor_url: None,
      timeout_secs: default_timeout_secs(),
      stale_responses: StaleResponsePolicy::default(),
    }
  }
}

impl Config {
  /// `<config dir>/distill/config.yaml`
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("distill").join("config.yaml"))
  }

  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      DistillError::config(format!("failed to read config file {}: {e}", path.display()))
    })?;
    serde_yaml::from_str(&content)
      .map_err(|e| DistillError::config(format!("invalid config file {}: {e}", path.display())))
  }

  /// Load the explicit file if given, otherwise the default file when it
  /// exists, then apply environment overrides. The result is not validated
  /// yet: command-line flags may still replace any field.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => match Self::default_path().filter(|path| path.exists()) {
        Some(path) => {
          debug!(path = %path.display(), "loading config file");
          Self::load_from_file(path)?
        }
        None => Self::default(),
      },
    };
    config.apply_env();
    Ok(config)
  }

  #[cfg(not(tarpaulin_include))]
  pub fn apply_env(&mut self) {
    self.apply_overrides(|key| std::env::var(key).ok());
  }

  /// Apply `DISTILL_*` overrides from `lookup`. Unparsable values are
  /// reported and ignored.
  pub fn apply_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(api_url) = lookup(ENV_API_URL) {
      self.api_url = api_url;
    }
    if let Some(extractor_url) = lookup(ENV_EXTRACTOR_URL) {
      self.extractor_url = Some(extractor_url);
    }
    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
      match raw.trim().parse() {
        Ok(secs) => self.timeout_secs = secs,
        Err(_) => warn!(value = %raw, "ignoring invalid {ENV_TIMEOUT_SECS}"),
      }
    }
    if let Some(raw) = lookup(ENV_STALE_RESPONSES) {
      match raw.parse() {
        Ok(policy) => self.stale_responses = policy,
        Err(e) => warn!("ignoring {ENV_STALE_RESPONSES}: {e}"),
      }
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.timeout_secs == 0 {
      return Err(DistillError::config("timeout_secs must be greater than zero"));
    }
    self.api_base()?;
    self.extractor_base()?;
    Ok(())
  }

  pub fn api_base(&self) -> Result<Url> {
    parse_base_url("api_url", &self.api_url)
  }

  pub fn extractor_base(&self) -> Result<Url> {
    match &self.extractor_url {
      Some(url) => parse_base_url("extractor_url", url),
      None => self.api_base(),
    }
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

fn parse_base_url(field: &str, raw: &str) -> Result<Url> {
  let url = Url::parse(raw.trim())
    .map_err(|e| DistillError::config(format!("{field} '{raw}' is not a valid URL: {e}")))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    scheme => Err(DistillError::config(format!("{field} must use http or https, not {scheme}"))),
  }
}
