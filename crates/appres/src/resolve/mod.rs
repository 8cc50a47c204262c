//! Query-time walk over one generation.
//!
//! # Mental Model
//!
//! A query is answered against a single pinned [`Generation`]. The walk collects the `(apps)`
//! anchors along the content path, deepest first, and runs an in-zone search below each one:
//!
//! ```text
//! /Root/Sites/(apps)/Folder/browse       <- tried second (wider anchor)
//! /Root/Sites/Docs/(apps)/This/browse    <- tried first (anchor owned by the content)
//! ```
//!
//! Inside an anchor, the type branch starts at the most specific type node the content's
//! ancestry reaches and climbs towards the anchor. At each type node the device terminals are
//! inspected (most specific device first), then the plain action terminal.
//!
//! # Invariants
//!
//! - `CLEAR` ends the walk: nothing wider than a clearing record resolves.
//!   - Tested by: `resolve::tests::clear_stops_inheritance`
//! - An override never resolves alone; it is merged onto the first wider non-override record.
//!   - Tested by: `resolve::tests::override_without_base_resolves_nothing`
//! - Adding a device to the query never loses an application the plain query resolves.
//!   - Tested by: `resolve::tests::device_fallback_is_monotonic`

use std::cmp::Ordering;
use std::iter;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::collab::{ContentTypes, SecurityOracle};
use crate::config::ResolverConfig;
use crate::content::ContentHead;
use crate::generation::Generation;
use crate::index::{IndexTree, NodeIndex, PathTokenizer, QueryScope, SegmentId, Zone};
use crate::permission::Permission;
use crate::record::{ApplicationRecord, RecordId};

mod listing;
mod resolved;

pub use listing::ListingOrder;
pub(crate) use resolved::OverrideChain;
pub use resolved::ResolvedApplication;


/// A type anchor (`(apps)` node) on the content path.
#[derive(Debug, Clone, Copy)]
struct Anchor {
	node: NodeIndex,
	/// The anchor sits directly under the content's own path, so `This` applies.
	owns_content: bool,
}

/// Outcome of one in-zone search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneHit {
	Clear(RecordId),
	Found(RecordId),
	Exhausted,
}

enum Candidate {
	Clear(RecordId),
	Override(RecordId),
	Accept(RecordId),
	Skip,
}

struct ZoneSearch<'q> {
	action: SegmentId,
	devices: &'q [SegmentId],
	scenario: Option<SegmentId>,
	context: &'q ContentHead,
}

/// Resolves applications against one generation on behalf of one caller.
pub struct Resolver<'a> {
	generation: Arc<Generation>,
	config: &'a ResolverConfig,
	types: &'a dyn ContentTypes,
	security: &'a dyn SecurityOracle,
}

impl<'a> Resolver<'a> {
	pub fn new(
		generation: Arc<Generation>,
		config: &'a ResolverConfig,
		types: &'a dyn ContentTypes,
		security: &'a dyn SecurityOracle,
	) -> Self {
		Self {
			generation,
			config,
			types,
			security,
		}
	}

	pub fn generation(&self) -> &Arc<Generation> {
		&self.generation
	}

	fn tokenizer(&self) -> PathTokenizer<'a> {
		PathTokenizer::new(self.config, self.types)
	}

	/// Resolves the application bound to `action` for `head`.
	///
	/// `None` selects the default action. `devices` is the fallback chain, most specific first.
	/// Unknown actions, unknown types, clearing records and unmatched overrides all yield `None`.
	pub fn resolve_one(
		&self,
		head: &ContentHead,
		action: Option<&str>,
		devices: &[String],
	) -> Option<ResolvedApplication> {
		let tree = &self.generation.tree;
		let query = self
			.tokenizer()
			.tokenize_query(&self.generation.segments, head, action, devices)?;
		let search = ZoneSearch {
			action: query.action,
			devices: &query.scope.devices,
			scenario: None,
			context: head,
		};

		let mut chain = OverrideChain::new();
		for anchor in anchors(tree, &query.scope) {
			for located in branches(tree, anchor, &query.scope) {
				match self.search_in_zone(located, anchor.node, &search, &mut chain) {
					ZoneHit::Clear(id) => {
						trace!(path = %head.path, cleared_by = %self.generation.record(id).path, "application cleared");
						return None;
					}
					ZoneHit::Found(id) => {
						return Some(ResolvedApplication::new(Arc::clone(&self.generation), id, chain));
					}
					ZoneHit::Exhausted => {}
				}
			}
		}
		None
	}

	/// Lists every application reachable from `head`, optionally restricted to `scenario`.
	///
	/// A scenario no indexed application carries yields an empty list.
	pub fn resolve_by_scenario(
		&self,
		head: &ContentHead,
		scenario: Option<&str>,
		devices: &[String],
		order: ListingOrder,
	) -> Vec<ResolvedApplication> {
		let segments = &self.generation.segments;
		let scenario = match scenario.map(str::trim) {
			Some(name) => match segments.get(name) {
				Some(id) => Some(id),
				None => return Vec::new(),
			},
			None => None,
		};
		let Some(scope) = self.tokenizer().tokenize_scope(segments, head, devices) else {
			return Vec::new();
		};

		let mut listing = listing::Accumulator::default();
		let tree = &self.generation.tree;
		for (position, anchor) in anchors(tree, &scope).into_iter().enumerate() {
			for located in branches(tree, anchor, &scope) {
				for action in action_names(tree, located, anchor.node) {
					let Some(mut chain) = listing.open(action, position) else {
						continue;
					};
					let search = ZoneSearch {
						action,
						devices: &scope.devices,
						scenario,
						context: head,
					};
					let hit = self.search_in_zone(located, anchor.node, &search, &mut chain);
					listing.settle(action, position, hit, chain);
				}
			}
		}

		let mut resolved = listing.finish(&self.generation);
		resolved.sort_by(|a, b| compare(a, b, order));
		resolved
	}

	/// Walks from `located` up to, not including, `anchor`.
	fn search_in_zone(
		&self,
		located: NodeIndex,
		anchor: NodeIndex,
		search: &ZoneSearch<'_>,
		chain: &mut OverrideChain,
	) -> ZoneHit {
		let tree = &self.generation.tree;
		let mut node = located;
		while node != anchor {
			if let Some(action_node) = tree.child(node, search.action, Zone::Action) {
				let device_nodes = search
					.devices
					.iter()
					.filter_map(|&device| tree.child(action_node, device, Zone::Device));
				for candidate in device_nodes.chain(iter::once(action_node)) {
					match self.inspect(candidate, search) {
						Candidate::Clear(id) => return ZoneHit::Clear(id),
						Candidate::Accept(id) => return ZoneHit::Found(id),
						Candidate::Override(id) => chain.push(id),
						Candidate::Skip => {}
					}
				}
			}
			match tree.parent(node) {
				Some(parent) => node = parent,
				None => break,
			}
		}
		ZoneHit::Exhausted
	}

	fn inspect(&self, node: NodeIndex, search: &ZoneSearch<'_>) -> Candidate {
		let node = self.generation.tree.node(node);
		let Some(id) = node.record else {
			return Candidate::Skip;
		};
		let record = self.generation.record(id);
		if record.is_clear() {
			return Candidate::Clear(id);
		}
		if search.scenario.is_some_and(|s| !node.in_scenario(s)) || node.disabled {
			return Candidate::Skip;
		}
		if !self.is_permitted(record, search.context) {
			trace!(application = %record.path, context = %search.context.path, "application not permitted");
			return Candidate::Skip;
		}
		if record.is_override() {
			Candidate::Override(id)
		} else {
			Candidate::Accept(id)
		}
	}

	fn is_permitted(&self, record: &ApplicationRecord, context: &ContentHead) -> bool {
		let security = self.security;
		let usable = |path: &str| {
			security.has_permission(path, Permission::Open) || security.has_permission(path, Permission::RunApplication)
		};
		if !usable(&record.path) {
			return false;
		}

		let deep = record.deep_permission_check();
		if deep
			&& !(security.has_subtree_permission(&record.path, Permission::Open)
				|| security.has_subtree_permission(&record.path, Permission::RunApplication))
		{
			return false;
		}
		record.required_permissions.permissions().all(|permission| {
			security.has_permission(&context.path, permission)
				&& (!deep || security.has_subtree_permission(&context.path, permission))
		})
	}
}

/// Type anchors along the content path, deepest first.
///
/// The path walk stops at the first segment the index does not continue with; anchors above it
/// remain candidates.
fn anchors(tree: &IndexTree, scope: &QueryScope) -> SmallVec<[Anchor; 8]> {
	let mut out = SmallVec::new();
	let mut node = tree.root();
	let mut depth = 0;
	loop {
		if let Some(anchor) = tree.child(node, scope.marker, Zone::Type) {
			out.push(Anchor {
				node: anchor,
				owns_content: depth == scope.path.len(),
			});
		}
		let Some(&Some(segment)) = scope.path.get(depth) else {
			break;
		};
		match tree.child(node, segment, Zone::Path) {
			Some(next) => node = next,
			None => break,
		}
		depth += 1;
	}
	out.reverse();
	out
}

/// Located type nodes to search under `anchor`: the `This` node first, when applicable, then the
/// deepest node the content's type ancestry reaches.
fn branches(tree: &IndexTree, anchor: Anchor, scope: &QueryScope) -> SmallVec<[NodeIndex; 2]> {
	let mut out = SmallVec::new();
	if anchor.owns_content
		&& let Some(this) = scope.this
		&& let Some(node) = tree.child(anchor.node, this, Zone::Type)
	{
		out.push(node);
	}

	let mut located = anchor.node;
	for &type_segment in &scope.types {
		match tree.child(located, type_segment, Zone::Type) {
			Some(next) => located = next,
			None => break,
		}
	}
	if located != anchor.node {
		out.push(located);
	}
	out
}

/// Distinct action names bound on the type chain from `located` up to `anchor`.
fn action_names(tree: &IndexTree, located: NodeIndex, anchor: NodeIndex) -> SmallVec<[SegmentId; 8]> {
	let mut names: SmallVec<[SegmentId; 8]> = SmallVec::new();
	let mut node = located;
	while node != anchor {
		for &child in tree.children(node) {
			let child = tree.node(child);
			if child.zone == Zone::Action
				&& let Some(segment) = child.segment
				&& !names.contains(&segment)
			{
				names.push(segment);
			}
		}
		match tree.parent(node) {
			Some(parent) => node = parent,
			None => break,
		}
	}
	names
}

fn compare(a: &ResolvedApplication, b: &ResolvedApplication, order: ListingOrder) -> Ordering {
	let by_index = a.index().cmp(&b.index());
	match order {
		ListingOrder::ByName => by_index.then_with(|| a.action_name().cmp(b.action_name())),
		ListingOrder::ByText => by_index
			.then_with(|| {
				let a_text = a.text().unwrap_or_default().to_lowercase();
				let b_text = b.text().unwrap_or_default().to_lowercase();
				a_text.cmp(&b_text)
			})
			.then_with(|| a.action_name().cmp(b.action_name())),
	}
}
