//! Generation holder with lazy rebuild and atomic publication.
//!
//! # Concurrency & ordering
//!
//! * Readers load the published generation with one `ArcSwap` load and keep the `Arc` for the
//!   rest of their query.
//! * Rebuilds are serialized by `build_lock`. Callers that find the generation stale queue on the
//!   lock and re-check after acquiring it, so N concurrent callers cause one build.
//! * Invalidation bumps `epoch` before clearing the slot. A publication carries the epoch it was
//!   started under; a mismatch makes it stale even if it was published after the invalidation.
//!
//! # Failure modes & recovery
//!
//! * Store errors publish the last good generation (or an empty one) flagged degraded. Degraded
//!   publications are retried after [`ResolverConfig::degraded_retry`].
//! * Action-name write-back failures are logged and do not affect the build.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn};

use super::{ContentEvent, Generation};
use crate::cluster::{ClusterChannel, InvalidationListener, InvalidationMessage, InvalidationReason, NodeId};
use crate::collab::{ApplicationStore, ContentTypes};
use crate::config::ResolverConfig;
use crate::content::AccessScope;
use crate::error::StoreError;
use crate::index::derive_action_name;
use crate::record::ApplicationRecord;

struct Published {
	generation: Arc<Generation>,
	epoch: u64,
	degraded_since: Option<Instant>,
}

pub struct GenerationManager {
	config: Arc<ResolverConfig>,
	store: Arc<dyn ApplicationStore>,
	types: Arc<dyn ContentTypes>,
	cluster: Option<Arc<dyn ClusterChannel>>,
	node_id: NodeId,
	published: ArcSwapOption<Published>,
	last_good: ArcSwapOption<Generation>,
	build_lock: Mutex<()>,
	epoch: AtomicU64,
	builds: AtomicU64,
}

impl GenerationManager {
	pub fn new(
		config: Arc<ResolverConfig>,
		store: Arc<dyn ApplicationStore>,
		types: Arc<dyn ContentTypes>,
		cluster: Option<Arc<dyn ClusterChannel>>,
	) -> Self {
		Self {
			config,
			store,
			types,
			cluster,
			node_id: NodeId::random(),
			published: ArcSwapOption::empty(),
			last_good: ArcSwapOption::empty(),
			build_lock: Mutex::new(()),
			epoch: AtomicU64::new(0),
			builds: AtomicU64::new(0),
		}
	}

	pub fn node_id(&self) -> NodeId {
		self.node_id
	}

	pub fn config(&self) -> &ResolverConfig {
		&self.config
	}

	/// Returns the current generation, building it first if it is missing or stale.
	pub fn current(&self) -> Arc<Generation> {
		if let Some(generation) = self.fresh() {
			return generation;
		}
		let _guard = self.build_lock.lock();
		if let Some(generation) = self.fresh() {
			return generation;
		}
		self.rebuild()
	}

	/// Returns the published generation without building, if one exists.
	pub fn peek(&self) -> Option<Arc<Generation>> {
		self.published
			.load_full()
			.map(|published| Arc::clone(&published.generation))
	}

	/// Returns true if the published generation is a degraded fallback.
	pub fn is_degraded(&self) -> bool {
		self.published
			.load_full()
			.is_some_and(|published| published.degraded_since.is_some())
	}

	/// Number of builds attempted so far.
	pub fn build_count(&self) -> u64 {
		self.builds.load(Ordering::Acquire)
	}

	fn fresh(&self) -> Option<Arc<Generation>> {
		let published = self.published.load_full()?;
		if published.epoch != self.epoch.load(Ordering::Acquire) {
			return None;
		}
		if let Some(since) = published.degraded_since
			&& since.elapsed() >= self.config.degraded_retry()
		{
			return None;
		}
		Some(Arc::clone(&published.generation))
	}

	fn rebuild(&self) -> Arc<Generation> {
		let epoch = self.epoch.load(Ordering::Acquire);
		let number = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
		let span = info_span!("apps.rebuild", generation = number);
		let _enter = span.enter();

		let published = match self.load_records() {
			Ok(records) => {
				let generation = Arc::new(Generation::build(number, records, self.types.as_ref(), &self.config));
				self.last_good.store(Some(Arc::clone(&generation)));
				Published {
					generation,
					epoch,
					degraded_since: None,
				}
			}
			Err(err) => {
				let generation = self
					.last_good
					.load_full()
					.unwrap_or_else(|| Arc::new(Generation::empty(number)));
				error!(
					error = %err,
					fallback = generation.number(),
					"application store unavailable; serving degraded index"
				);
				Published {
					generation,
					epoch,
					degraded_since: Some(Instant::now()),
				}
			}
		};

		let generation = Arc::clone(&published.generation);
		self.published.store(Some(Arc::new(published)));
		generation
	}

	fn load_records(&self) -> Result<Vec<ApplicationRecord>, StoreError> {
		let mut records = self.store.load_all_applications(AccessScope::Elevated)?;
		for record in &mut records {
			if record.action_name.as_deref().is_some_and(|name| !name.trim().is_empty()) {
				continue;
			}
			let Some(name) = derive_action_name(&record.path, &self.config) else {
				continue;
			};
			match self
				.store
				.persist_action_name(record.id, &name, AccessScope::Elevated)
			{
				Ok(()) => debug!(id = record.id, action = %name, "filled missing action name"),
				Err(err) => warn!(id = record.id, error = %err, "could not persist derived action name"),
			}
			record.action_name = Some(name);
		}
		Ok(records)
	}

	/// Drops the local generation and tells the cluster to do the same.
	pub fn invalidate(&self, reason: InvalidationReason) {
		self.drop_local(&reason);
		let Some(cluster) = &self.cluster else {
			return;
		};
		let message = InvalidationMessage {
			sender: self.node_id,
			reason,
		};
		if let Err(err) = cluster.broadcast(&message) {
			warn!(error = %err, "failed to broadcast application invalidation");
		}
	}

	/// Handles a message from the cluster. Returns true if the local generation was dropped.
	pub fn on_cluster_message(&self, message: &InvalidationMessage) -> bool {
		if message.sender == self.node_id {
			debug!(reason = %message.reason, "ignoring own invalidation echo");
			return false;
		}
		self.drop_local(&message.reason);
		true
	}

	fn drop_local(&self, reason: &InvalidationReason) {
		self.epoch.fetch_add(1, Ordering::AcqRel);
		self.published.store(None);
		info!(%reason, "application index invalidated");
	}

	/// Evaluates a content event and invalidates if it can change resolution.
	///
	/// Returns true if an invalidation was issued.
	pub fn handle_event(&self, event: &ContentEvent) -> bool {
		let head = event.head();
		let is_application = self.types.is_a(&head.type_name, &self.config.application_type);
		let reference = self.peek().or_else(|| self.last_good.load_full());
		let touches_index = reference.is_some_and(|generation| {
			event
				.affected_paths()
				.any(|path| generation.has_applications_under(path))
		});

		if !is_application && !touches_index {
			debug!(kind = %event.kind(), path = %head.path, "content event does not affect applications");
			return false;
		}
		self.invalidate(InvalidationReason::Content {
			kind: event.kind(),
			path: head.path.clone(),
		});
		true
	}
}

impl InvalidationListener for GenerationManager {
	fn on_invalidation(&self, message: &InvalidationMessage) {
		self.on_cluster_message(message);
	}
}
