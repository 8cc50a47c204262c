use rustc_hash::FxHashMap;

use super::util::u32_index;
use crate::content::fold_case;

/// Interned, lower-cased name inside one generation.
///
/// Ids are dense and assigned in first-seen order. They mean nothing across generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

impl SegmentId {
	pub fn as_u32(self) -> u32 {
		self.0
	}
}

/// Append-only string interner for path, type, action, device and scenario names.
#[derive(Debug, Default, Clone)]
pub struct SegmentTable {
	by_name: FxHashMap<Box<str>, SegmentId>,
	names: Vec<Box<str>>,
}

impl SegmentTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Interns `name`, returning the existing id when already present.
	pub fn intern(&mut self, name: &str) -> SegmentId {
		let folded = fold_case(name);
		if let Some(&id) = self.by_name.get(folded.as_ref()) {
			return id;
		}
		let id = SegmentId(u32_index(self.names.len(), "segment"));
		let boxed: Box<str> = folded.into();
		self.names.push(boxed.clone());
		self.by_name.insert(boxed, id);
		id
	}

	/// Looks up `name` without interning it.
	pub fn get(&self, name: &str) -> Option<SegmentId> {
		self.by_name.get(fold_case(name).as_ref()).copied()
	}

	/// Returns the lower-cased name for `id`.
	pub fn resolve(&self, id: SegmentId) -> &str {
		&self.names[id.0 as usize]
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}
