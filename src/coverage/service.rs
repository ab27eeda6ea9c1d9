//! Request-level orchestration: sections → closure → case fan-out → result.
//!
//! A [`CoverageService`] holds no per-request state. Every call re-fetches
//! sections and cases from the upstream service.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};

use super::aggregate::aggregate;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::observability::redact_secrets;
use crate::sections::{build_section_tree, expand_selection, ClosureMode, ClosureOptions};
use crate::source::{fetch_cases, fetch_sections, TestSource};
use crate::types::{CoverageResult, Section, SectionNode, TestCase};

/// Tuning for upstream access and closure semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub page_size: usize,
    pub concurrency: usize,
    pub closure: ClosureOptions,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            page_size: crate::source::MAX_PAGE_SIZE,
            concurrency: 8,
            closure: ClosureOptions::default(),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            page_size: config.upstream.page_size,
            concurrency: config.upstream.concurrency,
            closure: config.aggregation.closure_options(),
        }
    }
}

/// Outcome of one per-section fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub sections_requested: usize,
    pub sections_failed: usize,
    pub cases_fetched: usize,
}

/// Fetch the cases of every section in `ids`.
///
/// Up to `concurrency` sections are fetched at once. Results are
/// concatenated in `ids` order. A section whose fetch fails is logged and
/// contributes no cases; the rest of the aggregation proceeds.
pub async fn collect_cases(
    source: &dyn TestSource,
    ids: &BTreeSet<i64>,
    page_size: usize,
    concurrency: usize,
) -> (Vec<TestCase>, FetchStats) {
    let results: Vec<(i64, Result<Vec<TestCase>>)> = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, fetch_cases(source, id, page_size).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut stats = FetchStats {
        sections_requested: ids.len(),
        ..FetchStats::default()
    };
    let mut cases = Vec::new();

    for (section_id, result) in results {
        match result {
            Ok(batch) => cases.extend(batch),
            Err(e) => {
                stats.sections_failed += 1;
                tracing::warn!(
                    operation = "get_cases",
                    section_id,
                    error = %redact_secrets(&e.to_string()),
                    "skipping section after failed case fetch"
                );
            }
        }
    }

    stats.cases_fetched = cases.len();
    (cases, stats)
}

/// Entry point for the dashboard's two queries.
#[derive(Clone)]
pub struct CoverageService {
    source: Arc<dyn TestSource>,
    settings: ServiceSettings,
}

impl CoverageService {
    pub fn new(source: Arc<dyn TestSource>, settings: ServiceSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Every section of the project. Any page failure fails the whole call.
    pub async fn sections(&self) -> Result<Vec<Section>> {
        fetch_sections(self.source.as_ref(), self.settings.page_size)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    operation = "get_sections",
                    error = %redact_secrets(&e.to_string()),
                    "section listing failed"
                );
            })
    }

    /// The section forest for folder selection.
    pub async fn section_tree(&self) -> Result<Vec<SectionNode>> {
        let sections = self.sections().await?;
        let tree = build_section_tree(&sections);
        tracing::info!(sections = sections.len(), roots = tree.len(), "built section tree");
        Ok(tree)
    }

    /// Coverage of `folder_ids` using the configured closure options.
    pub async fn coverage(&self, folder_ids: &[i64]) -> Result<CoverageResult> {
        self.coverage_with(folder_ids, self.settings.closure).await
    }

    /// Coverage of `folder_ids` with explicit closure options.
    ///
    /// An empty selection returns the zero result without any upstream
    /// call. Strict mode skips the section listing since no expansion is
    /// needed.
    pub async fn coverage_with(
        &self,
        folder_ids: &[i64],
        options: ClosureOptions,
    ) -> Result<CoverageResult> {
        if folder_ids.is_empty() {
            return Ok(aggregate(&[]));
        }

        let started = Instant::now();
        let closure = match options.mode {
            ClosureMode::Strict => folder_ids.iter().copied().collect(),
            ClosureMode::Inclusive => {
                let sections = self.sections().await?;
                expand_selection(&sections, folder_ids, options)?
            }
        };

        let (cases, stats) = collect_cases(
            self.source.as_ref(),
            &closure,
            self.settings.page_size,
            self.settings.concurrency,
        )
        .await;
        let result = aggregate(&cases);

        tracing::info!(
            selected = folder_ids.len(),
            sections = stats.sections_requested,
            failed = stats.sections_failed,
            cases = stats.cases_fetched,
            coverage = %result.overall_coverage,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed coverage"
        );

        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
