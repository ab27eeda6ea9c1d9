//! Configuration: YAML schema plus layered loading.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{AggregationConfig, DashboardConfig, RateLimitConfig, ServerConfig, UpstreamConfig};
