//! Command-line interface.
//!
//! `serve` runs the dashboard; `sections`, `coverage` and `chart` run a
//! single query against the configured upstream and print or write the
//! result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::chart::{render_pie_svg, ChartOptions};
use crate::config::{load_config, DashboardConfig};
use crate::coverage::{CoverageService, ServiceSettings};
use crate::error::Result;
use crate::sections::ClosureMode;
use crate::server::run_server;
use crate::source::HttpTestSource;

#[derive(Debug, Parser)]
#[command(name = "autocov", version, about = "Test automation coverage dashboard")]
pub struct Cli {
    /// Config file layered over user and project config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP dashboard.
    Serve {
        /// Listen address, overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the section tree as JSON.
    Sections,
    /// Print coverage for the given folder ids as JSON.
    Coverage(SelectionArgs),
    /// Write an SVG pie chart for the given folder ids.
    Chart {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Destination file.
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long, default_value = "Automation coverage")]
        title: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Selected section ids.
    #[arg(required = true)]
    pub ids: Vec<i64>,
    /// Count only the selected sections themselves.
    #[arg(long)]
    pub strict: bool,
    /// Do not count cases owned by ancestors of selected sections.
    #[arg(long)]
    pub no_ancestors: bool,
}

/// Fold command-line flags into the loaded config.
pub fn apply_overrides(config: &mut DashboardConfig, command: &Command) {
    match command {
        Command::Serve { bind: Some(bind) } => config.server.bind = bind.clone(),
        Command::Coverage(selection) | Command::Chart { selection, .. } => {
            if selection.strict {
                config.aggregation.mode = ClosureMode::Strict;
            }
            if selection.no_ancestors {
                config.aggregation.include_ancestors = false;
            }
        }
        _ => {}
    }
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let project_root = std::env::current_dir().ok();
    let mut config = load_config(cli.config.as_deref(), project_root.as_deref())?;
    apply_overrides(&mut config, &cli.command);
    config.validate()?;

    let source = HttpTestSource::from_config(&config.upstream)?;
    let service = CoverageService::new(Arc::new(source), ServiceSettings::from_config(&config));

    match cli.command {
        Command::Serve { .. } => run_server(&config, service).await,
        Command::Sections => {
            let tree = service.section_tree().await?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
            Ok(())
        }
        Command::Coverage(selection) => {
            let result = service.coverage(&selection.ids).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Chart {
            selection,
            output,
            title,
        } => {
            let result = service.coverage(&selection.ids).await?;
            let options = ChartOptions::titled(title).with_timestamp(chrono::Utc::now());
            std::fs::write(&output, render_pie_svg(&result, &options))?;
            tracing::info!(
                "wrote chart to {} ({}% automated)",
                output.display(),
                result.overall_coverage
            );
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
