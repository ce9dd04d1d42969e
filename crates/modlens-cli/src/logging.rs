//! Diagnostics for `modlens` runs, written to stderr.
//!
//! `modlens-core` only emits `tracing` events. At `-v` the resolver reports
//! fallbacks (extension probing, ignored manifests, skipped keyword
//! validation); at `-vv` it also traces every anchor it tries and each
//! package it finds. Stdout carries command output only.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets whose level follows `-v`. Everything else keeps the base filter.
const MODLENS_TARGETS: &[&str] = &["modlens", "modlens_core", "modlens_cli"];

fn level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `base` with every modlens target raised to `level`.
fn modlens_filter(base: EnvFilter, level: Level) -> EnvFilter {
    MODLENS_TARGETS.iter().fold(base, |filter, target| {
        match format!("{target}={level}").parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    })
}

/// Install the global subscriber.
///
/// `RUST_LOG` sets the base filter for dependencies (`warn` when unset).
/// With `json`, events are JSON lines carrying the current span, matching
/// the `--json` command output.
pub fn init(verbosity: u8, json: bool) {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let filter = modlens_filter(base, level(verbosity));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0), Level::INFO);
        assert_eq!(level(1), Level::DEBUG);
        assert_eq!(level(2), Level::TRACE);
        assert_eq!(level(7), Level::TRACE);
    }

    #[test]
    fn test_filter_raises_modlens_targets_only() {
        let filter = modlens_filter(EnvFilter::new("warn"), Level::DEBUG)
            .to_string()
            .to_lowercase();
        for target in MODLENS_TARGETS {
            assert!(filter.contains(&format!("{target}=debug")), "{filter}");
        }
        assert!(filter.contains("warn"), "{filter}");
    }
}
