//! Tracing subscriber setup for the binary.
//!
//! Filter priority, highest first:
//!
//! 1. `BUILDCLEANER_LOG` (e.g. `build_cleaner=trace`)
//! 2. `RUST_LOG`
//! 3. CLI flags: `-v` debug, `-q` error
//! 4. `warn`

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Env var consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "BUILDCLEANER_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Pick the filter directives for the given environment values.
fn directives(custom: Option<String>, rust_log: Option<String>, verbosity: Verbosity) -> String {
    custom
        .filter(|v| !v.trim().is_empty())
        .or_else(|| rust_log.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| verbosity.default_level().to_string().to_lowercase())
}

/// Install the global subscriber, writing to stderr.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init(verbosity: Verbosity) {
    let directives = directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        verbosity,
    );
    let filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_level().to_string().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    fn test_directive_priority() {
        assert_eq!(
            directives(Some("build_cleaner=trace".into()), Some("info".into()), Verbosity::Quiet),
            "build_cleaner=trace"
        );
        assert_eq!(directives(None, Some("info".into()), Verbosity::Quiet), "info");
        assert_eq!(directives(Some("  ".into()), None, Verbosity::Verbose), "debug");
        assert_eq!(directives(None, None, Verbosity::Normal), "warn");
    }
}
