//! Classification and percentage math over a flat list of cases.

use crate::types::{
    AutomationStatus, CaseRef, CategoryCounts, CategoryPercentages, CoverageResult, TestCase,
};

/// Format `count / total` as a percentage with one decimal.
///
/// Returns `"0"` when `total` is zero. Halves round away from zero (1/16 is
/// `"6.3"`, not `"6.2"`). Each category is rounded on its own, so the three
/// values may sum to 99.9 or 100.1.
pub fn format_percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    let tenths = (count as f64 * 1000.0 / total as f64).round();
    format!("{:.1}", tenths / 10.0)
}

/// Aggregate cases into counts, percentages and per-category case lists.
///
/// `overall_coverage` is the automated share only; candidates do not count
/// as covered.
pub fn aggregate(cases: &[TestCase]) -> CoverageResult {
    let mut counts = CategoryCounts::default();
    let mut candidate_tests = Vec::new();
    let mut no_tests = Vec::new();

    for case in cases {
        counts.record(case.automation_status);
        match case.automation_status {
            AutomationStatus::Yes => {}
            AutomationStatus::Candidate => candidate_tests.push(CaseRef::from(case)),
            AutomationStatus::No => no_tests.push(CaseRef::from(case)),
        }
    }

    let total = counts.total();
    let percentages = CategoryPercentages {
        yes: format_percentage(counts.yes, total),
        candidate: format_percentage(counts.candidate, total),
        no: format_percentage(counts.no, total),
    };

    CoverageResult {
        total_counts: counts,
        overall_coverage: percentages.yes.clone(),
        percentages,
        candidate_tests,
        no_tests,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
