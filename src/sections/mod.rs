//! Section hierarchy algorithms.
//!
//! - [`tree`]: rebuilds the folder forest from the flat parent-pointer list
//! - [`closure`]: expands a user selection to the set of sections whose
//!   cases must be fetched

pub mod closure;
pub mod tree;

pub use closure::{expand_selection, ClosureMode, ClosureOptions, ParentMap};
pub use tree::{build_section_tree, flatten_preorder};
