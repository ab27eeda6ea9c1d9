//! Configuration data structures for autocov.
//!
//! Defines the YAML config format: HTTP server settings, the upstream
//! test-management connection, and aggregation semantics. Every field has a
//! default so partial files are valid.

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::sections::{ClosureMode, ClosureOptions};
use crate::source::MAX_PAGE_SIZE;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for autocov.
///
/// Loaded from YAML files and environment variables, then adjusted by CLI
/// flags. See [`crate::config::loader`] for the merge order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(CoverageError::config(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.server.rate_limit.max_requests == 0 || self.server.rate_limit.window_secs == 0 {
            return Err(CoverageError::config(
                "server.rate_limit.max_requests and window_secs must be positive",
            ));
        }
        if self.upstream.concurrency == 0 {
            return Err(CoverageError::config("upstream.concurrency must be positive"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.upstream.page_size) {
            return Err(CoverageError::config(format!(
                "upstream.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.upstream.base_url.as_deref().map_or(true, str::is_empty) {
            return Err(CoverageError::config("upstream.base_url is not set"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Inbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:3001`.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Value of `Access-Control-Allow-Origin`.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-client request ceiling over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// UpstreamConfig
// ---------------------------------------------------------------------------

/// Connection to the test-management service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API root, e.g. `https://acme.testrail.io/index.php?/api/v2`.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_project_id")]
    pub project_id: i64,

    #[serde(default)]
    pub suite_id: Option<i64>,

    /// Account name for basic auth. Without it the API key is sent as a
    /// bearer token.
    #[serde(default)]
    pub user: Option<String>,

    /// Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<Secret>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent per-section case fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: default_project_id(),
            suite_id: None,
            user: None,
            api_key: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ---------------------------------------------------------------------------
// AggregationConfig
// ---------------------------------------------------------------------------

/// How a folder selection is turned into the set of sections to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub mode: ClosureMode,

    /// Count cases owned directly by ancestors of selected folders.
    #[serde(default = "default_include_ancestors")]
    pub include_ancestors: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mode: ClosureMode::Inclusive,
            include_ancestors: default_include_ancestors(),
        }
    }
}

impl AggregationConfig {
    pub fn closure_options(&self) -> ClosureOptions {
        ClosureOptions {
            mode: self.mode,
            include_ancestors: self.include_ancestors,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_project_id() -> i64 {
    1
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_include_ancestors() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
