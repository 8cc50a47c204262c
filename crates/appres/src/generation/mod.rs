//! Immutable index generations and their lifecycle.
//!
//! # Mental Model
//!
//! A [`Generation`] is everything one rebuild produces: the segment table, the trie, the record
//! arena and the name sets used for existence checks. It is built off to the side and published
//! whole by [`GenerationManager`]; nothing inside it changes afterwards.
//!
//! # Invariants
//!
//! - Readers only ever see a fully built generation.
//!   - Enforced in: [`GenerationManager::current`] (build under lock, publish by swap).
//!   - Tested by: `generation::tests::concurrent_callers_share_one_build`
//! - A build that raced an invalidation is never treated as fresh.
//!   - Enforced in: the epoch check in [`GenerationManager::current`].
//!   - Tested by: `generation::tests::invalidation_during_build_forces_another_build`

use std::collections::BTreeSet;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::collab::ContentTypes;
use crate::config::ResolverConfig;
use crate::content::{fold_case, normalize_path};
use crate::error::UnindexablePath;
use crate::index::{Attachment, IndexTree, PathTokenizer, SegmentTable, u32_index};
use crate::record::{ApplicationRecord, RecordId};

mod events;
mod manager;

pub use events::ContentEvent;
pub use manager::GenerationManager;


/// A record left out of the index, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
	pub id: u64,
	pub path: String,
	pub reason: UnindexablePath,
}

/// Two records that tokenized to the same terminal; the later one won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCollision {
	pub kept_path: String,
	pub dropped_path: String,
}

/// Data-quality findings from one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildDiagnostics {
	pub dropped: Vec<DroppedRecord>,
	pub collisions: Vec<TerminalCollision>,
}

/// One complete, immutable build of the application index.
#[derive(Debug)]
pub struct Generation {
	number: u64,
	pub(crate) segments: SegmentTable,
	pub(crate) tree: IndexTree,
	pub(crate) records: Vec<ApplicationRecord>,
	action_names: FxHashSet<Box<str>>,
	/// Lower-cased scenario name → first spelling seen.
	scenarios: FxHashMap<Box<str>, Box<str>>,
	/// Normalized paths of indexed records, sorted.
	app_paths: Vec<Box<str>>,
	diagnostics: BuildDiagnostics,
	built_at: Instant,
}

impl Generation {
	/// A generation that resolves nothing.
	pub fn empty(number: u64) -> Self {
		Self {
			number,
			segments: SegmentTable::new(),
			tree: IndexTree::new(),
			records: Vec::new(),
			action_names: FxHashSet::default(),
			scenarios: FxHashMap::default(),
			app_paths: Vec::new(),
			diagnostics: BuildDiagnostics::default(),
			built_at: Instant::now(),
		}
	}

	/// Builds a generation from loaded records.
	///
	/// Records are inserted in path order, so for duplicate terminals the record with the greater
	/// path (and, on equal paths, the later one in `records`) wins. Records without a logical
	/// action name, or whose path cannot be tokenized, are dropped and reported.
	pub fn build(
		number: u64,
		mut records: Vec<ApplicationRecord>,
		types: &dyn ContentTypes,
		config: &ResolverConfig,
	) -> Self {
		records.sort_by_cached_key(|r| normalize_path(&r.path));

		let tokenizer = PathTokenizer::new(config, types);
		let mut generation = Self::empty(number);

		for record in records {
			let tokenized = match record.action_name.as_deref() {
				Some(action) => tokenizer.tokenize_index(&mut generation.segments, &record.path, action),
				None => Err(UnindexablePath::MissingAction),
			};
			let tokenized = match tokenized {
				Ok(tokenized) => tokenized,
				Err(reason) => {
					warn!(id = record.id, path = %record.path, %reason, "application dropped from index");
					generation.diagnostics.dropped.push(DroppedRecord {
						id: record.id,
						path: record.path,
						reason,
					});
					continue;
				}
			};

			let record_id = RecordId(u32_index(generation.records.len(), "record"));
			let scenarios: SmallVec<_> = record
				.scenarios
				.iter()
				.map(|s| generation.segments.intern(s))
				.collect();
			let attachment = Attachment {
				record: record_id,
				disabled: record.is_disabled(),
				scenarios,
			};

			if let Some(previous) = generation.tree.insert(&tokenized, attachment) {
				let dropped_path = generation.records[previous.index()].path.clone();
				warn!(kept = %record.path, dropped = %dropped_path, "duplicate application terminal; last one wins");
				generation.diagnostics.collisions.push(TerminalCollision {
					kept_path: record.path.clone(),
					dropped_path,
				});
			}

			if let Some(action) = record.action_name.as_deref() {
				generation.action_names.insert(fold_case(action.trim()).into());
			}
			for scenario in &record.scenarios {
				generation
					.scenarios
					.entry(fold_case(scenario).into())
					.or_insert_with(|| scenario.as_str().into());
			}
			generation.records.push(record);
		}

		let mut app_paths: Vec<Box<str>> = generation
			.tree
			.records()
			.map(|id| normalize_path(&generation.records[id.index()].path).into())
			.collect();
		app_paths.sort_unstable();
		generation.app_paths = app_paths;
		generation.built_at = Instant::now();
		debug!(
			generation = number,
			records = generation.records.len(),
			nodes = generation.tree.len(),
			segments = generation.segments.len(),
			dropped = generation.diagnostics.dropped.len(),
			collisions = generation.diagnostics.collisions.len(),
			"application index built"
		);
		generation
	}

	/// Monotonic build number within one manager.
	pub fn number(&self) -> u64 {
		self.number
	}

	pub fn built_at(&self) -> Instant {
		self.built_at
	}

	/// Number of records in the arena, shadowed duplicates included.
	pub fn record_count(&self) -> usize {
		self.records.len()
	}

	pub fn node_count(&self) -> usize {
		self.tree.len()
	}

	pub fn record(&self, id: RecordId) -> &ApplicationRecord {
		&self.records[id.index()]
	}

	pub fn tree(&self) -> &IndexTree {
		&self.tree
	}

	pub fn segments(&self) -> &SegmentTable {
		&self.segments
	}

	pub fn diagnostics(&self) -> &BuildDiagnostics {
		&self.diagnostics
	}

	/// Returns true if any indexed application uses `action` (case-insensitive).
	pub fn exists(&self, action: &str) -> bool {
		self.action_names.contains(fold_case(action.trim()).as_ref())
	}

	/// Scenario names of indexed applications, in their first-seen spelling.
	pub fn known_scenarios(&self) -> BTreeSet<String> {
		self.scenarios.values().map(|s| s.to_string()).collect()
	}

	/// Returns true if an indexed application lives at `path` or anywhere below it.
	pub fn has_applications_under(&self, path: &str) -> bool {
		let prefix = normalize_path(path);
		let start = self.app_paths.partition_point(|p| p.as_ref() < prefix.as_str());
		self.app_paths[start..]
			.iter()
			.take_while(|p| p.starts_with(prefix.as_str()))
			.any(|p| p.len() == prefix.len() || p.as_bytes()[prefix.len()] == b'/')
	}
}
