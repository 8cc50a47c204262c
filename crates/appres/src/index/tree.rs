//! Arena trie over tokenized application paths.
//!
//! # Invariants
//!
//! - Only the terminal node of an inserted path carries a record; intermediate nodes never do.
//! - A child is identified by `(segment, zone)`, so a type and an action sharing a name under the
//!   same parent are distinct nodes.
//! - The tree is never mutated after its generation is published.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::segment::SegmentId;
use super::tokenize::TokenizedPath;
use super::util::u32_index;
use crate::record::RecordId;

/// Tier of a tokenized path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
	/// Literal repository path segment, or the root.
	Path,
	/// The apps marker, a content-type name, or the `This` pseudo-type.
	Type,
	/// Logical action name.
	Action,
	/// Device name.
	Device,
}

/// Handle of a node inside one [`IndexTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
	/// The tree root. Always present.
	pub const ROOT: NodeIndex = NodeIndex(0);

	fn index(self) -> usize {
		self.0 as usize
	}
}

/// Scenario ids cached on a record-bearing node.
pub type ScenarioSet = SmallVec<[SegmentId; 4]>;

#[derive(Debug, Clone)]
pub struct IndexNode {
	/// `None` only for the root.
	pub segment: Option<SegmentId>,
	pub zone: Zone,
	pub parent: Option<NodeIndex>,
	pub children: Vec<NodeIndex>,
	pub record: Option<RecordId>,
	/// Copied from the record for filtering without touching the record arena.
	pub disabled: bool,
	pub scenarios: ScenarioSet,
}

impl IndexNode {
	fn new(segment: Option<SegmentId>, zone: Zone, parent: Option<NodeIndex>) -> Self {
		Self {
			segment,
			zone,
			parent,
			children: Vec::new(),
			record: None,
			disabled: false,
			scenarios: SmallVec::new(),
		}
	}

	/// Returns true if `scenario` is among the record's scenarios.
	pub fn in_scenario(&self, scenario: SegmentId) -> bool {
		self.scenarios.contains(&scenario)
	}
}

/// Payload attached to a terminal node on insertion.
#[derive(Debug, Clone)]
pub struct Attachment {
	pub record: RecordId,
	pub disabled: bool,
	pub scenarios: ScenarioSet,
}

#[derive(Debug, Clone)]
pub struct IndexTree {
	nodes: Vec<IndexNode>,
	edges: FxHashMap<(NodeIndex, SegmentId, Zone), NodeIndex>,
}

impl Default for IndexTree {
	fn default() -> Self {
		Self::new()
	}
}

impl IndexTree {
	pub fn new() -> Self {
		Self {
			nodes: vec![IndexNode::new(None, Zone::Path, None)],
			edges: FxHashMap::default(),
		}
	}

	/// Inserts a tokenized path, attaching `attachment` to its terminal node.
	///
	/// Returns the record previously attached to that terminal, if any. The new record replaces
	/// it.
	pub fn insert(&mut self, path: &TokenizedPath, attachment: Attachment) -> Option<RecordId> {
		let mut node = NodeIndex::ROOT;
		for (depth, &segment) in path.segments.iter().enumerate() {
			node = self.child_or_insert(node, segment, path.zone(depth));
		}
		if node == NodeIndex::ROOT {
			return None;
		}
		let terminal = &mut self.nodes[node.index()];
		let previous = terminal.record.replace(attachment.record);
		terminal.disabled = attachment.disabled;
		terminal.scenarios = attachment.scenarios;
		previous
	}

	fn child_or_insert(&mut self, parent: NodeIndex, segment: SegmentId, zone: Zone) -> NodeIndex {
		if let Some(&child) = self.edges.get(&(parent, segment, zone)) {
			return child;
		}
		let child = NodeIndex(u32_index(self.nodes.len(), "index node"));
		self.nodes.push(IndexNode::new(Some(segment), zone, Some(parent)));
		self.nodes[parent.index()].children.push(child);
		self.edges.insert((parent, segment, zone), child);
		child
	}

	pub fn root(&self) -> NodeIndex {
		NodeIndex::ROOT
	}

	pub fn node(&self, id: NodeIndex) -> &IndexNode {
		&self.nodes[id.index()]
	}

	/// Follows the `(segment, zone)` edge out of `parent`.
	pub fn child(&self, parent: NodeIndex, segment: SegmentId, zone: Zone) -> Option<NodeIndex> {
		self.edges.get(&(parent, segment, zone)).copied()
	}

	/// Children in insertion order.
	pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
		&self.nodes[parent.index()].children
	}

	pub fn parent(&self, id: NodeIndex) -> Option<NodeIndex> {
		self.nodes[id.index()].parent
	}

	/// Records attached anywhere in the tree.
	pub fn records(&self) -> impl Iterator<Item = RecordId> + '_ {
		self.nodes.iter().filter_map(|node| node.record)
	}

	/// Number of nodes, root included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Returns true if nothing besides the root exists.
	pub fn is_empty(&self) -> bool {
		self.nodes.len() == 1
	}
}
