//! In-memory collaborators for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::collab::{ApplicationStore, ContentTypes, DeviceResolver, SecurityOracle};
use crate::config::ResolverConfig;
use crate::content::{AccessScope, ContentHead};
use crate::error::StoreError;
use crate::generation::Generation;
use crate::permission::Permission;
use crate::record::ApplicationRecord;

/// Type hierarchy keyed by lower-cased name.
pub(crate) struct StaticTypes {
	types: FxHashMap<String, (String, Option<String>)>,
}

impl StaticTypes {
	pub(crate) fn new(defs: &[(&str, Option<&str>)]) -> Self {
		let types = defs
			.iter()
			.map(|(name, parent)| {
				(
					name.to_lowercase(),
					(name.to_string(), parent.map(str::to_lowercase)),
				)
			})
			.collect();
		Self { types }
	}

	/// GenericContent at the root; Folder, File and Application below it; Workspace below Folder.
	pub(crate) fn standard() -> Self {
		Self::new(&[
			("GenericContent", None),
			("Folder", Some("GenericContent")),
			("Workspace", Some("Folder")),
			("File", Some("GenericContent")),
			("Application", Some("GenericContent")),
			("WebPage", Some("Application")),
		])
	}
}

impl ContentTypes for StaticTypes {
	fn ancestry(&self, type_name: &str) -> Option<Vec<String>> {
		let mut chain = Vec::new();
		let mut current = Some(type_name.to_lowercase());
		while let Some(key) = current {
			let (name, parent) = self.types.get(&key)?;
			chain.push(name.clone());
			current = parent.clone();
		}
		chain.reverse();
		Some(chain)
	}
}

#[derive(Default)]
pub(crate) struct MemoryStore {
	records: Mutex<Vec<ApplicationRecord>>,
	persisted: Mutex<Vec<(u64, String)>>,
	loads: AtomicUsize,
	unavailable: AtomicBool,
	reject_writes: AtomicBool,
	load_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
	pub(crate) fn with_records(records: Vec<ApplicationRecord>) -> Arc<Self> {
		let store = Self::default();
		*store.records.lock() = records;
		Arc::new(store)
	}

	pub(crate) fn push(&self, record: ApplicationRecord) {
		self.records.lock().push(record);
	}

	pub(crate) fn remove(&self, id: u64) {
		self.records.lock().retain(|r| r.id != id);
	}

	pub(crate) fn loads(&self) -> usize {
		self.loads.load(Ordering::SeqCst)
	}

	pub(crate) fn persisted(&self) -> Vec<(u64, String)> {
		self.persisted.lock().clone()
	}

	pub(crate) fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	pub(crate) fn set_reject_writes(&self, reject: bool) {
		self.reject_writes.store(reject, Ordering::SeqCst);
	}

	pub(crate) fn set_load_delay(&self, delay: Duration) {
		*self.load_delay.lock() = Some(delay);
	}
}

impl ApplicationStore for MemoryStore {
	fn load_all_applications(&self, scope: AccessScope) -> Result<Vec<ApplicationRecord>, StoreError> {
		assert_eq!(scope, AccessScope::Elevated, "index loads must run elevated");
		self.loads.fetch_add(1, Ordering::SeqCst);
		let delay = *self.load_delay.lock();
		if let Some(delay) = delay {
			std::thread::sleep(delay);
		}
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(StoreError::Unavailable("connection refused".to_string()));
		}
		Ok(self.records.lock().clone())
	}

	fn persist_action_name(&self, id: u64, action_name: &str, scope: AccessScope) -> Result<(), StoreError> {
		assert_eq!(scope, AccessScope::Elevated, "write-back must run elevated");
		if self.reject_writes.load(Ordering::SeqCst) {
			return Err(StoreError::WriteRejected {
				id,
				reason: "read-only".to_string(),
			});
		}
		self.persisted.lock().push((id, action_name.to_string()));
		let mut records = self.records.lock();
		if let Some(record) = records.iter_mut().find(|r| r.id == id) {
			record.action_name = Some(action_name.to_string());
		}
		Ok(())
	}
}

/// Grants everything except explicitly denied `(path, permission)` pairs.
#[derive(Default)]
pub(crate) struct Grants {
	denied: Mutex<FxHashSet<(String, Permission)>>,
	denied_subtree: Mutex<FxHashSet<(String, Permission)>>,
}

impl Grants {
	pub(crate) fn allow_all() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub(crate) fn deny(&self, path: &str, permission: Permission) {
		self.denied.lock().insert((path.to_lowercase(), permission));
	}

	pub(crate) fn deny_subtree(&self, path: &str, permission: Permission) {
		self.denied_subtree
			.lock()
			.insert((path.to_lowercase(), permission));
	}
}

impl SecurityOracle for Grants {
	fn has_permission(&self, path: &str, permission: Permission) -> bool {
		!self.denied.lock().contains(&(path.to_lowercase(), permission))
	}

	fn has_subtree_permission(&self, path: &str, permission: Permission) -> bool {
		self.has_permission(path, permission)
			&& !self
				.denied_subtree
				.lock()
				.contains(&(path.to_lowercase(), permission))
	}
}

/// `iphone` falls back to `mobile`; `ipad` to `tablet` then `mobile`.
pub(crate) struct StaticDevices;

impl DeviceResolver for StaticDevices {
	fn device_chain(&self, device: &str) -> Vec<String> {
		let chain: &[&str] = match device.to_lowercase().as_str() {
			"iphone" => &["iphone", "mobile"],
			"ipad" => &["ipad", "tablet", "mobile"],
			"tablet" => &["tablet", "mobile"],
			"mobile" => &["mobile"],
			_ => &[],
		};
		chain.iter().map(|d| d.to_string()).collect()
	}

	fn identify_device(&self, user_agent: &str) -> Option<String> {
		if user_agent.contains("iPhone") {
			Some("iphone".to_string())
		} else if user_agent.contains("iPad") {
			Some("ipad".to_string())
		} else {
			None
		}
	}
}

pub(crate) fn app(id: u64, path: &str) -> ApplicationRecord {
	ApplicationRecord::new(id, path)
}

pub(crate) fn head(id: u64, path: &str, type_name: &str) -> ContentHead {
	ContentHead::new(id, path, type_name)
}

/// Builds a generation directly, filling missing action names from the path.
pub(crate) fn build_generation(records: Vec<ApplicationRecord>) -> Arc<Generation> {
	let config = ResolverConfig::default();
	let records = records
		.into_iter()
		.map(|mut r| {
			if r.action_name.is_none() {
				r.action_name = crate::index::derive_action_name(&r.path, &config);
			}
			r
		})
		.collect();
	Arc::new(Generation::build(1, records, &StaticTypes::standard(), &config))
}
