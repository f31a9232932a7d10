//! Tracing subscriber setup for the `distill` binary.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const QUIET_FILTER: &str = "distill=warn";
const VERBOSE_FILTER: &str = "distill=debug,info";

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(verbose: bool) -> &'static str {
  if verbose {
    VERBOSE_FILTER
  } else {
    QUIET_FILTER
  }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine readable. Calling this twice is harmless.
#[cfg(not(tarpaulin_include))]
pub fn init(verbose: bool) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .try_init();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_directives() {
    assert_eq!(default_directives(false), "distill=warn");
    assert_eq!(default_directives(true), "distill=debug,info");
  }

  #[test]
  fn test_init_twice_does_not_panic() {
    init(false);
    init(true);
  }
}
