//! Structured logging and secret redaction.
//!
//! This module provides:
//! - [`init_logging`]: One-time structured logging setup with `RUST_LOG` support
//! - [`redact_secrets`]: Scrubs credentials from upstream text before it is
//!   logged or returned to a client

use std::sync::LazyLock;

use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `autocov=info` when `RUST_LOG` is not set. Logs go to stderr
/// so CLI output on stdout stays machine-readable. Call once at program
/// startup; later calls are ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autocov=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let patterns: &[(&str, &str)] = &[
        (
            r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*['"]?([a-zA-Z0-9_\-]{8,})['"]?"#,
            "$1=***REDACTED***",
        ),
        (
            r#"(?i)(password|passwd|pwd)\s*[:=]\s*['"]?([^\s'"]{8,})['"]?"#,
            "$1=***REDACTED***",
        ),
        (
            r#"(?i)(secret|token)\s*[:=]\s*['"]?([a-zA-Z0-9_\-]{20,})['"]?"#,
            "$1=***REDACTED***",
        ),
        (
            r"(?i)Bearer\s+[a-zA-Z0-9_\-\.]{20,}",
            "Bearer ***REDACTED***",
        ),
        (r"(?i)Basic\s+[a-zA-Z0-9+/=]{8,}", "Basic ***REDACTED***"),
        // user:password@host in URLs
        (r"(?i)(https?://)[^\s/:@]+:[^\s/@]+@", "$1***REDACTED***@"),
    ];
    patterns
        .iter()
        .filter_map(|(p, r)| Regex::new(p).ok().map(|re| (re, *r)))
        .collect()
});

/// Redact potential secrets from text.
///
/// Replaces API keys, passwords, tokens, `Authorization` header values and
/// URL userinfo with `***REDACTED***`.
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in SECRET_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
