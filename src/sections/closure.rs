//! Selection closure: which sections must be fetched for a coverage query.
//!
//! Test cases belong to exactly one section and are not inherited, so a
//! coverage query over a selected folder needs the cases of the folder and
//! of every descendant. The inclusive mode also pulls in every ancestor of a
//! selected folder; their directly owned cases then count towards the
//! result. That over-counting is kept as the default and can be switched off
//! with [`ClosureOptions::include_ancestors`].

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::types::Section;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How far a selection is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureMode {
    /// Selected sections, their descendants and (optionally) their ancestors.
    #[default]
    Inclusive,
    /// Exactly the selected sections.
    Strict,
}

impl ClosureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::Strict => "strict",
        }
    }
}

impl std::fmt::Display for ClosureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for [`expand_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureOptions {
    pub mode: ClosureMode,
    /// Add every ancestor of a selected section (inclusive mode only).
    pub include_ancestors: bool,
}

impl Default for ClosureOptions {
    fn default() -> Self {
        Self {
            mode: ClosureMode::Inclusive,
            include_ancestors: true,
        }
    }
}

impl ClosureOptions {
    pub fn strict() -> Self {
        Self {
            mode: ClosureMode::Strict,
            include_ancestors: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ParentMap
// ---------------------------------------------------------------------------

/// Id → parent lookup over the full section list.
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<i64, Option<i64>>,
}

impl ParentMap {
    pub fn new(sections: &[Section]) -> Self {
        Self {
            parents: sections.iter().map(|s| (s.id, s.parent())).collect(),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Parent of `id`, or `None` for roots and unknown ids.
    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.parents.get(&id).copied().flatten()
    }

    /// Ancestors of `id`, nearest first.
    ///
    /// The walk stops at a root or at a parent id that is not a known
    /// section. Such a dangling parent id is still returned, as the last
    /// element. Revisiting a section means the parent pointers form a cycle
    /// and yields [`CoverageError::Cycle`].
    pub fn ancestors(&self, id: i64) -> Result<Vec<i64>> {
        let mut visited = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent_of(current) {
            if !visited.insert(parent) {
                return Err(CoverageError::Cycle { section_id: parent });
            }
            chain.push(parent);
            if !self.contains(parent) {
                break;
            }
            current = parent;
        }

        Ok(chain)
    }
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Expand `selected` into the closure set of section ids to fetch.
///
/// Inclusive mode returns the selected ids, every ancestor of a selected id
/// (unless disabled), and every section with a selected ancestor. Selected
/// ids unknown to `sections` are kept as-is. The result is sorted, which
/// makes downstream fetch order deterministic.
pub fn expand_selection(
    sections: &[Section],
    selected: &[i64],
    options: ClosureOptions,
) -> Result<BTreeSet<i64>> {
    let mut closure: BTreeSet<i64> = selected.iter().copied().collect();
    if options.mode == ClosureMode::Strict || selected.is_empty() {
        return Ok(closure);
    }

    let selected_set: HashSet<i64> = selected.iter().copied().collect();
    let parents = ParentMap::new(sections);

    if options.include_ancestors {
        for &id in &selected_set {
            closure.extend(parents.ancestors(id)?);
        }
    }

    for section in sections {
        let chain = parents.ancestors(section.id)?;
        if chain.iter().any(|a| selected_set.contains(a)) {
            closure.insert(section.id);
        }
    }

    tracing::debug!(
        selected = selected_set.len(),
        closure = closure.len(),
        sections = parents.len(),
        mode = %options.mode,
        "expanded section selection"
    );

    Ok(closure)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
