//! Application records as loaded from the store.
//!
//! A record is immutable once its generation is built. Merging an override onto a base record
//! never copies or mutates either side; see [`crate::ResolvedApplication`] for the merged view.

use std::collections::BTreeMap;

use crate::permission::PermissionSet;


/// Field carrying the human-readable title used by text-ordered listings.
pub const FIELD_TEXT: &str = "text";
/// Field carrying the icon name.
pub const FIELD_ICON: &str = "icon";

/// Fields an override can never contribute to a merged application.
///
/// Covers identity, location, audit, locking, security and save-state attributes. Matching is
/// ASCII case-insensitive.
pub const NON_OVERRIDABLE_FIELDS: &[&str] = &[
	// identity and location
	"id",
	"parent_id",
	"version_id",
	"name",
	"path",
	"content_type",
	"is_override",
	// audit
	"created_by",
	"creation_date",
	"modified_by",
	"modification_date",
	"version",
	// locking
	"locked",
	"locked_by",
	"lock_date",
	"lock_token",
	"lock_timeout",
	"checked_out_to",
	// security
	"owner",
	"security",
	"inherits_permissions",
	"required_permissions",
	// save state
	"saving_state",
];

/// Returns true if an override may supply `field`.
pub fn is_overridable(field: &str) -> bool {
	!NON_OVERRIDABLE_FIELDS
		.iter()
		.any(|excluded| excluded.eq_ignore_ascii_case(field))
}

/// Dense handle of a record inside one generation's record arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) u32);

impl RecordId {
	pub fn as_u32(self) -> u32 {
		self.0
	}

	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

bitflags::bitflags! {
	/// Behavioral flags of an application record.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct RecordFlags: u8 {
		/// Skipped during resolution; wider scopes stay reachable.
		const DISABLED = 1 << 0;
		/// Stops inheritance: nothing wider than this record resolves.
		const CLEAR = 1 << 1;
		/// Must be merged onto a wider, non-override record.
		const OVERRIDE = 1 << 2;
		/// Permission checks cover the context's whole subtree.
		const DEEP_PERMISSION_CHECK = 1 << 3;
	}
}

/// Loosely typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
	Text(String),
	Int(i64),
	Bool(bool),
	List(Vec<String>),
}

impl FieldValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}
}

impl From<&str> for FieldValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<i64> for FieldValue {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<bool> for FieldValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

/// One configured application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
	/// Content id in the backing store.
	pub id: u64,
	/// Repository path of the application content.
	pub path: String,
	/// Logical action name. Derived from the path when the store has none.
	pub action_name: Option<String>,
	/// Scenario tags, in configured order.
	pub scenarios: Vec<String>,
	pub flags: RecordFlags,
	/// Listing order; lower sorts first. Unset reads as 0 and lets an override's value through.
	pub index: Option<i32>,
	/// Permissions the caller needs on the context content.
	pub required_permissions: PermissionSet,
	/// Opaque identifier handed to the action instantiation layer.
	pub action_type: Option<String>,
	/// Remaining attributes, keyed by field name.
	pub fields: BTreeMap<String, FieldValue>,
}

impl ApplicationRecord {
	pub fn new(id: u64, path: impl Into<String>) -> Self {
		Self {
			id,
			path: path.into(),
			action_name: None,
			scenarios: Vec::new(),
			flags: RecordFlags::empty(),
			index: None,
			required_permissions: PermissionSet::empty(),
			action_type: None,
			fields: BTreeMap::new(),
		}
	}

	pub fn with_action_name(mut self, name: impl Into<String>) -> Self {
		self.action_name = Some(name.into());
		self
	}

	/// Sets scenarios from a comma-separated list, trimming blanks.
	pub fn with_scenarios(mut self, scenarios: &str) -> Self {
		self.scenarios = parse_scenarios(scenarios);
		self
	}

	pub fn with_flags(mut self, flags: RecordFlags) -> Self {
		self.flags |= flags;
		self
	}

	pub fn with_index(mut self, index: i32) -> Self {
		self.index = Some(index);
		self
	}

	pub fn with_required_permissions(mut self, permissions: PermissionSet) -> Self {
		self.required_permissions = permissions;
		self
	}

	pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
		self.action_type = Some(action_type.into());
		self
	}

	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.fields.insert(name.into(), value.into());
		self
	}

	pub fn is_disabled(&self) -> bool {
		self.flags.contains(RecordFlags::DISABLED)
	}

	pub fn is_clear(&self) -> bool {
		self.flags.contains(RecordFlags::CLEAR)
	}

	pub fn is_override(&self) -> bool {
		self.flags.contains(RecordFlags::OVERRIDE)
	}

	pub fn deep_permission_check(&self) -> bool {
		self.flags.contains(RecordFlags::DEEP_PERMISSION_CHECK)
	}

	/// Returns true if the record is tagged with `scenario` (ASCII case-insensitive).
	pub fn has_scenario(&self, scenario: &str) -> bool {
		self.scenarios
			.iter()
			.any(|s| s.eq_ignore_ascii_case(scenario))
	}

	/// Looks up a field on this record alone, without override fall-through.
	pub fn field(&self, name: &str) -> Option<&FieldValue> {
		self.fields.get(name).or_else(|| {
			self.fields
				.iter()
				.find(|(key, _)| key.eq_ignore_ascii_case(name))
				.map(|(_, value)| value)
		})
	}
}

/// Splits a comma-separated scenario list.
pub fn parse_scenarios(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}
