//! Core domain types for autocov.
//!
//! Mirrors the JSON shapes exchanged with the test-management service and
//! with the dashboard front end.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A folder-like grouping of test cases as returned by the upstream service.
///
/// `parent_id` of `None` or `Some(0)` marks a root section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl Section {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    /// The parent id with the `0` root sentinel normalized away.
    pub fn parent(&self) -> Option<i64> {
        self.parent_id.filter(|&p| p != 0)
    }
}

/// A section with its children attached, as rendered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    pub fn leaf(section: &Section) -> Self {
        Self {
            id: section.id,
            name: section.name.clone(),
            parent_id: section.parent_id,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(SectionNode::size).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// AutomationStatus
// ---------------------------------------------------------------------------

/// Automation classification of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutomationStatus {
    /// Code `1`: fully automated.
    Yes,
    /// Code `3`: candidate for automation.
    Candidate,
    /// Code `2`, and every unknown or missing code.
    #[default]
    No,
}

impl AutomationStatus {
    /// Convert a raw upstream status value into a category.
    ///
    /// Total: numbers and numeric strings map through the code table, and
    /// anything unrecognised (other codes, `null`, objects, garbage strings)
    /// yields [`AutomationStatus::No`].
    pub fn from_code(raw: &serde_json::Value) -> Self {
        let code = match raw {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match code {
            Some(1) => Self::Yes,
            Some(3) => Self::Candidate,
            _ => Self::No,
        }
    }

    /// Canonical upstream code for this category.
    pub fn code(&self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 2,
            Self::Candidate => 3,
        }
    }

    /// Human-readable label used in charts and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yes => "Automated",
            Self::Candidate => "Automation candidate",
            Self::No => "Not automated",
        }
    }
}

impl std::fmt::Display for AutomationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AutomationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for AutomationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_code(&raw))
    }
}

// ---------------------------------------------------------------------------
// TestCase
// ---------------------------------------------------------------------------

/// A single test case belonging to one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(
        default,
        rename = "automationStatus",
        alias = "automation_status",
        alias = "custom_automation_status"
    )]
    pub automation_status: AutomationStatus,
}

impl TestCase {
    pub fn new(id: i64, title: impl Into<String>, automation_status: AutomationStatus) -> Self {
        Self {
            id,
            title: title.into(),
            automation_status,
        }
    }
}

// ---------------------------------------------------------------------------
// CoverageResult
// ---------------------------------------------------------------------------

/// Per-category case counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(rename = "Yes")]
    pub yes: usize,
    #[serde(rename = "Candidate")]
    pub candidate: usize,
    #[serde(rename = "No")]
    pub no: usize,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.yes + self.candidate + self.no
    }

    pub fn get(&self, status: AutomationStatus) -> usize {
        match status {
            AutomationStatus::Yes => self.yes,
            AutomationStatus::Candidate => self.candidate,
            AutomationStatus::No => self.no,
        }
    }

    pub fn record(&mut self, status: AutomationStatus) {
        match status {
            AutomationStatus::Yes => self.yes += 1,
            AutomationStatus::Candidate => self.candidate += 1,
            AutomationStatus::No => self.no += 1,
        }
    }
}

/// Per-category percentages, each already formatted for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPercentages {
    #[serde(rename = "Yes")]
    pub yes: String,
    #[serde(rename = "Candidate")]
    pub candidate: String,
    #[serde(rename = "No")]
    pub no: String,
}

/// Id and title of a case listed in a coverage breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    pub id: i64,
    pub title: String,
}

impl From<&TestCase> for CaseRef {
    fn from(case: &TestCase) -> Self {
        Self {
            id: case.id,
            title: case.title.clone(),
        }
    }
}

/// Aggregated automation coverage for one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    pub total_counts: CategoryCounts,
    pub percentages: CategoryPercentages,
    /// Always equal to `percentages.yes`: only fully automated cases count.
    pub overall_coverage: String,
    pub candidate_tests: Vec<CaseRef>,
    pub no_tests: Vec<CaseRef>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(1), AutomationStatus::Yes ; "numeric one is automated")]
    #[test_case(json!("1"), AutomationStatus::Yes ; "string one is automated")]
    #[test_case(json!(" 3 "), AutomationStatus::Candidate ; "padded string three is candidate")]
    #[test_case(json!(3), AutomationStatus::Candidate ; "numeric three is candidate")]
    #[test_case(json!(2), AutomationStatus::No ; "numeric two is no")]
    #[test_case(json!(1.0), AutomationStatus::Yes ; "integral float is accepted")]
    #[test_case(json!(7), AutomationStatus::No ; "unknown code defaults to no")]
    #[test_case(json!(null), AutomationStatus::No ; "null defaults to no")]
    #[test_case(json!("yes"), AutomationStatus::No ; "non numeric string defaults to no")]
    #[test_case(json!({"code": 1}), AutomationStatus::No ; "object defaults to no")]
    fn status_from_code(raw: serde_json::Value, expected: AutomationStatus) {
        assert_eq!(AutomationStatus::from_code(&raw), expected);
    }

    #[test]
    fn section_parent_normalizes_zero() {
        assert_eq!(Section::new(1, "a", Some(0)).parent(), None);
        assert_eq!(Section::new(1, "a", None).parent(), None);
        assert_eq!(Section::new(1, "a", Some(5)).parent(), Some(5));
    }

    #[test]
    fn section_deserializes_missing_parent_as_root() {
        let s: Section = serde_json::from_value(json!({"id": 4, "name": "Login"})).unwrap();
        assert_eq!(s.parent(), None);
    }

    #[test]
    fn test_case_accepts_every_status_field_name() {
        for key in ["automationStatus", "automation_status", "custom_automation_status"] {
            let mut raw = json!({"id": 1, "title": "t"});
            raw[key] = json!("3");
            let case: TestCase = serde_json::from_value(raw).unwrap();
            assert_eq!(case.automation_status, AutomationStatus::Candidate, "key {key}");
        }
    }

    #[test]
    fn test_case_without_status_is_no() {
        let case: TestCase = serde_json::from_value(json!({"id": 9, "title": "t"})).unwrap();
        assert_eq!(case.automation_status, AutomationStatus::No);
    }

    #[test]
    fn coverage_result_uses_wire_field_names() {
        let result = CoverageResult {
            total_counts: CategoryCounts {
                yes: 1,
                candidate: 0,
                no: 0,
            },
            percentages: CategoryPercentages {
                yes: "100.0".into(),
                candidate: "0.0".into(),
                no: "0.0".into(),
            },
            overall_coverage: "100.0".into(),
            candidate_tests: vec![],
            no_tests: vec![],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalCounts"]["Yes"], json!(1));
        assert_eq!(value["percentages"]["Yes"], json!("100.0"));
        assert_eq!(value["overallCoverage"], json!("100.0"));
        assert!(value["candidateTests"].is_array());
        assert!(value["noTests"].is_array());
    }

    #[test]
    fn section_node_size_counts_descendants() {
        let mut root = SectionNode::leaf(&Section::new(1, "root", None));
        let mut child = SectionNode::leaf(&Section::new(2, "child", Some(1)));
        child
            .children
            .push(SectionNode::leaf(&Section::new(3, "leaf", Some(2))));
        root.children.push(child);
        assert_eq!(root.size(), 3);
    }
}
