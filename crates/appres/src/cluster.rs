//! Cluster-wide invalidation messages.
//!
//! Every process holding a generation listens on a shared channel. Invalidating locally also
//! broadcasts; receivers drop their generation unless the message is their own echo. Delivery is
//! at-least-once: rebuilding is idempotent, so duplicates only cost a rebuild.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ClusterError;

/// Identity of one cooperating process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
	pub fn random() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Kind of content event that triggered an invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
	Created,
	Modified,
	Deleted,
	Destroyed,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Created => "created",
			Self::Modified => "modified",
			Self::Deleted => "deleted",
			Self::Destroyed => "destroyed",
		};
		f.write_str(name)
	}
}

/// Why a generation was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationReason {
	/// A content event touched an application or a subtree holding one.
	Content { kind: EventKind, path: String },
	/// Requested explicitly.
	Manual,
}

impl fmt::Display for InvalidationReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Content { kind, path } => write!(f, "{kind} {path}"),
			Self::Manual => f.write_str("manual"),
		}
	}
}

/// Broadcast payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationMessage {
	pub sender: NodeId,
	pub reason: InvalidationReason,
}

/// Outbound side of the cluster transport.
pub trait ClusterChannel: Send + Sync {
	fn broadcast(&self, message: &InvalidationMessage) -> Result<(), ClusterError>;
}

/// Inbound side: anything that drops state on invalidation.
pub trait InvalidationListener: Send + Sync {
	fn on_invalidation(&self, message: &InvalidationMessage);
}

/// In-process channel delivering synchronously to every live subscriber, sender included.
#[derive(Default)]
pub struct LoopbackCluster {
	listeners: RwLock<Vec<Weak<dyn InvalidationListener>>>,
	closed: AtomicBool,
}

impl LoopbackCluster {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn subscribe(&self, listener: Weak<dyn InvalidationListener>) {
		self.listeners.write().push(listener);
	}

	/// Rejects further broadcasts.
	pub fn close(&self) {
		self.closed.store(true, Ordering::Release);
	}

	/// Number of subscribers still alive.
	pub fn listener_count(&self) -> usize {
		self.listeners
			.read()
			.iter()
			.filter(|l| l.strong_count() > 0)
			.count()
	}
}

impl ClusterChannel for LoopbackCluster {
	fn broadcast(&self, message: &InvalidationMessage) -> Result<(), ClusterError> {
		if self.closed.load(Ordering::Acquire) {
			return Err(ClusterError::Closed);
		}
		// Deliver outside the lock so listeners may subscribe or broadcast re-entrantly.
		let listeners: Vec<_> = {
			let mut guard = self.listeners.write();
			guard.retain(|l| l.strong_count() > 0);
			guard.iter().filter_map(Weak::upgrade).collect()
		};
		debug!(sender = %message.sender, reason = %message.reason, receivers = listeners.len(), "broadcasting invalidation");
		for listener in listeners {
			listener.on_invalidation(message);
		}
		Ok(())
	}
}
