//! Rebuilds the section forest from a flat list of parent pointers.
//!
//! The upstream service returns sections in arbitrary order, each carrying
//! only its parent id. Building is two passes over the input: index every
//! section by id, then attach each section to its parent (or to the root
//! list). Siblings keep their input order.

use std::collections::HashMap;

use crate::types::{Section, SectionNode};

/// Build the forest of root [`SectionNode`]s from a flat section list.
///
/// A section is a root when its parent is `None`, `0`, or an id that does
/// not occur in `sections`. Orphans are therefore kept, never dropped.
///
/// Every input section appears exactly once in the output. Sections caught
/// in a parent cycle are unreachable from any root; the first of them (in
/// input order) is promoted to a root and the cycle is cut there.
///
/// Building, serializing and dropping a [`SectionNode`] recurse once per
/// level. Chains a few thousand sections deep can exhaust a 2 MB thread
/// stack; real hierarchies are far shallower.
pub fn build_section_tree(sections: &[Section]) -> Vec<SectionNode> {
    let index: HashMap<i64, usize> = sections
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); sections.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        match section.parent().and_then(|p| index.get(&p)) {
            Some(&parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut emitted = vec![false; sections.len()];
    let mut forest: Vec<SectionNode> = roots
        .iter()
        .map(|&i| attach(i, sections, &children, &mut emitted))
        .collect();

    for i in 0..sections.len() {
        if !emitted[i] {
            tracing::warn!(
                section_id = sections[i].id,
                "section is part of a parent cycle, promoting it to a root"
            );
            forest.push(attach(i, sections, &children, &mut emitted));
        }
    }

    forest
}

fn attach(
    idx: usize,
    sections: &[Section],
    children: &[Vec<usize>],
    emitted: &mut [bool],
) -> SectionNode {
    emitted[idx] = true;
    let mut node = SectionNode::leaf(&sections[idx]);
    for &child in &children[idx] {
        if !emitted[child] {
            node.children.push(attach(child, sections, children, emitted));
        }
    }
    node
}

/// Collect ids of a forest in pre-order (parent before children).
pub fn flatten_preorder(forest: &[SectionNode]) -> Vec<i64> {
    let mut out = Vec::new();
    let mut stack: Vec<&SectionNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.id);
        stack.extend(node.children.iter().rev());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
