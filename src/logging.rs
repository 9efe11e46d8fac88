//! Tracing setup for the `part-tally` binary.
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "part_tally=info";
const VERBOSE_LOG_FILTER: &str = "part_tally=debug";

/// Filter from `RUST_LOG`, or the crate default for the verbosity.
pub fn log_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs a stderr fmt layer as the global subscriber.
///
/// Output goes to stderr so that stdout carries only command results.
pub fn init_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_filter(log_filter(verbose)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_fails() {
        let _ = init_logging(false);
        assert!(init_logging(true).is_err());
    }
}
