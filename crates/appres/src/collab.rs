//! Collaborator seams.
//!
//! The resolver owns none of these concerns. Each trait is the narrowest surface the index build
//! and the resolution walk need from the surrounding platform.

use crate::content::AccessScope;
use crate::error::StoreError;
use crate::permission::Permission;
use crate::record::ApplicationRecord;

/// Backing content store holding the application records.
pub trait ApplicationStore: Send + Sync {
	/// Loads every application record in the repository.
	fn load_all_applications(&self, scope: AccessScope) -> Result<Vec<ApplicationRecord>, StoreError>;

	/// Persists a derived logical action name onto a record that lacked one.
	fn persist_action_name(&self, id: u64, action_name: &str, scope: AccessScope) -> Result<(), StoreError>;
}

/// Content-type hierarchy lookup.
pub trait ContentTypes: Send + Sync {
	/// Returns the ancestry of `type_name`, root-most first and ending with the type itself.
	///
	/// `None` means the type is unknown.
	fn ancestry(&self, type_name: &str) -> Option<Vec<String>>;

	/// Returns true if `type_name` is `ancestor` or inherits from it.
	fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
		self.ancestry(type_name)
			.is_some_and(|chain| chain.iter().any(|t| t.eq_ignore_ascii_case(ancestor)))
	}
}

/// Permission checks for the current caller.
pub trait SecurityOracle: Send + Sync {
	/// Returns true if the caller holds `permission` on the content at `path`.
	fn has_permission(&self, path: &str, permission: Permission) -> bool;

	/// Returns true if the caller holds `permission` on `path` and every item below it.
	fn has_subtree_permission(&self, path: &str, permission: Permission) -> bool;
}

/// Device identification and fallback chains.
pub trait DeviceResolver: Send + Sync {
	/// Returns the fallback chain for `device`, most specific first and starting with `device`.
	fn device_chain(&self, device: &str) -> Vec<String>;

	/// Identifies the device behind a user agent string.
	fn identify_device(&self, user_agent: &str) -> Option<String>;
}
