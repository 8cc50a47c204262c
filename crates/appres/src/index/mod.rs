//! Segment interning, path tokenization and the arena trie.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`SegmentTable`] | Lower-cased name → dense id, one per generation. |
//! | [`PathTokenizer`] | Index-time and query-time zoned tokenization. |
//! | [`IndexTree`] | Arena trie; records hang off Action/Device terminals. |

mod segment;
mod tokenize;
mod tree;
mod util;

pub use segment::{SegmentId, SegmentTable};
pub use tokenize::{PathTokenizer, QueryPath, QueryScope, TokenizedPath, derive_action_name};
pub use tree::{Attachment, IndexNode, IndexTree, NodeIndex, ScenarioSet, Zone};
pub(crate) use util::u32_index;
