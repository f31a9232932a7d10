pub mod commands;
pub mod display;
pub mod shell;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  /// Colored, human-readable output
  #[default]
  Pretty,
  /// Pretty-printed JSON on stdout
  Json,
}
