//! Coverage aggregation.
//!
//! - [`aggregate`]: pure classification and percentage math
//! - [`service`]: fetch orchestration with per-section failure tolerance

pub mod aggregate;
pub mod service;

pub use aggregate::{aggregate, format_percentage};
pub use service::{collect_cases, CoverageService, FetchStats, ServiceSettings};
