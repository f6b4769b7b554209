//! Tracing setup for the `dex` binary
//!
//! Diagnostics go to stderr; stdout belongs to the running program.

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Dex-specific filter variable, checked before `RUST_LOG`
pub const LOG_ENV: &str = "DEX_LOG";

/// Install the global subscriber. Safe to call multiple times.
///
/// Nothing is installed unless `--verbose` is given or `DEX_LOG`/`RUST_LOG`
/// is set, e.g. `DEX_LOG=dex_core=trace`.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let directive = filter_directive(
            verbose,
            std::env::var(LOG_ENV).ok(),
            std::env::var("RUST_LOG").ok(),
        );

        if let Some(directive) = directive {
            let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
                eprintln!("Ignoring invalid log filter {:?}: {}", directive, e);
                EnvFilter::new("warn")
            });
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn filter_directive(
    verbose: bool,
    dex_log: Option<String>,
    rust_log: Option<String>,
) -> Option<String> {
    if verbose {
        return Some("debug".to_string());
    }
    dex_log.or(rust_log).filter(|d| !d.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_filter_without_request() {
        assert_eq!(filter_directive(false, None, None), None);
        assert_eq!(filter_directive(false, Some("  ".to_string()), None), None);
    }

    #[test]
    fn test_verbose_forces_debug() {
        assert_eq!(
            filter_directive(true, Some("trace".to_string()), None),
            Some("debug".to_string())
        );
    }

    #[test]
    fn test_dex_log_takes_precedence() {
        assert_eq!(
            filter_directive(false, Some("dex_core=trace".to_string()), Some("info".to_string())),
            Some("dex_core=trace".to_string())
        );
        assert_eq!(
            filter_directive(false, None, Some("info".to_string())),
            Some("info".to_string())
        );
    }
}
