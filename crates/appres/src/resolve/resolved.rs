use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::generation::Generation;
use crate::permission::PermissionSet;
use crate::record::{ApplicationRecord, FIELD_ICON, FIELD_TEXT, FieldValue, RecordFlags, RecordId, is_overridable};

/// Override records waiting for, or merged onto, a base record. Most specific first.
pub(crate) type OverrideChain = SmallVec<[RecordId; 2]>;

/// A resolved application: a base record plus the overrides merged onto it.
///
/// Pins the generation it was resolved from, so it stays valid across rebuilds.
///
/// Attribute reads consult the overrides (most specific first) and then the base, except for
/// [`crate::record::NON_OVERRIDABLE_FIELDS`], which always come from the base. Flags and required
/// permissions are security and identity attributes and also come from the base; `index`,
/// `action_type` and a non-empty scenario list fall through like fields.
#[derive(Clone)]
pub struct ResolvedApplication {
	generation: Arc<Generation>,
	base: RecordId,
	overrides: OverrideChain,
}

impl ResolvedApplication {
	pub(crate) fn new(generation: Arc<Generation>, base: RecordId, overrides: OverrideChain) -> Self {
		Self {
			generation,
			base,
			overrides,
		}
	}

	/// The non-override record this application resolved to.
	pub fn base(&self) -> &ApplicationRecord {
		self.generation.record(self.base)
	}

	pub fn base_id(&self) -> RecordId {
		self.base
	}

	/// Merged overrides, most specific first.
	pub fn overrides(&self) -> impl Iterator<Item = &ApplicationRecord> {
		self.overrides.iter().map(|&id| self.generation.record(id))
	}

	pub fn is_merged(&self) -> bool {
		!self.overrides.is_empty()
	}

	/// Build number of the generation this was resolved from.
	pub fn generation(&self) -> u64 {
		self.generation.number()
	}

	pub fn id(&self) -> u64 {
		self.base().id
	}

	pub fn path(&self) -> &str {
		&self.base().path
	}

	pub fn action_name(&self) -> &str {
		self.base().action_name.as_deref().unwrap_or_default()
	}

	pub fn index(&self) -> i32 {
		self.overrides()
			.find_map(|o| o.index)
			.or(self.base().index)
			.unwrap_or_default()
	}

	pub fn flags(&self) -> RecordFlags {
		self.base().flags
	}

	pub fn required_permissions(&self) -> PermissionSet {
		self.base().required_permissions
	}

	pub fn action_type(&self) -> Option<&str> {
		self.overrides()
			.find_map(|o| o.action_type.as_deref())
			.or(self.base().action_type.as_deref())
	}

	pub fn scenarios(&self) -> &[String] {
		self.overrides()
			.find(|o| !o.scenarios.is_empty())
			.map_or(&self.base().scenarios, |o| &o.scenarios)
	}

	/// Reads a field through the override chain.
	pub fn field(&self, name: &str) -> Option<&FieldValue> {
		if is_overridable(name)
			&& let Some(value) = self.overrides().find_map(|o| o.field(name))
		{
			return Some(value);
		}
		self.base().field(name)
	}

	pub fn text(&self) -> Option<&str> {
		self.field(FIELD_TEXT).and_then(FieldValue::as_str)
	}

	pub fn icon(&self) -> Option<&str> {
		self.field(FIELD_ICON).and_then(FieldValue::as_str)
	}
}

impl fmt::Debug for ResolvedApplication {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedApplication")
			.field("path", &self.path())
			.field("action", &self.action_name())
			.field(
				"overrides",
				&self.overrides().map(|o| o.path.as_str()).collect::<Vec<_>>(),
			)
			.field("generation", &self.generation())
			.finish()
	}
}
