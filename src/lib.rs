//! autocov: test automation coverage dashboard.
//!
//! Pulls the section hierarchy and test cases from a test-management
//! service, expands a folder selection to the sections it covers, and
//! reports how much of it is automated, as JSON or as an SVG pie chart.

pub mod chart;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod observability;
pub mod sections;
pub mod server;
pub mod source;
pub mod types;
