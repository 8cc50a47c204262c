//! Application resolution for content repositories.
//!
//! Applications are configured content items living under `(apps)` folders anywhere in the
//! repository tree. Each one binds an action name to a scope built from four zones:
//!
//! | Zone | Source | Example |
//! |------|--------|---------|
//! | Path | literal repository path above `(apps)` | `/Root/Sites/Intranet` |
//! | Type | content type (expanded to its ancestry) or `This` | `Folder` |
//! | Action | logical action name | `browse` |
//! | Device | optional device name | `iphone` |
//!
//! # Mental Model
//!
//! 1. **Build:** [`GenerationManager`] loads every application record from the
//!    [`ApplicationStore`], tokenizes its path through a per-generation [`SegmentTable`] and
//!    inserts it into an arena [`IndexTree`].
//! 2. **Publication:** the finished [`Generation`] is swapped in atomically. Readers pin one
//!    `Arc<Generation>` per query and never observe a partial build.
//! 3. **Resolution:** [`ApplicationResolver::resolve_one`] walks from the most specific scope
//!    outward, honoring `CLEAR` (stop), `OVERRIDE` (merge onto a wider record), `DISABLED` and
//!    permission filters. [`ApplicationResolver::resolve_by_scenario`] does the same for every
//!    action reachable from the content.
//! 4. **Invalidation:** content events that touch applications drop the generation locally and
//!    broadcast an [`InvalidationMessage`] to peers. The next query rebuilds.
//!
//! # Failure Model
//!
//! Resolution never errors. Unindexable records are dropped with a warning, store outages
//! degrade to the last good (or an empty) generation, and unknown names resolve to nothing.

mod cluster;
mod collab;
mod config;
mod content;
mod error;
pub mod generation;
pub mod index;
mod permission;
pub mod record;
pub mod resolve;
mod service;

pub use cluster::{
	ClusterChannel, EventKind, InvalidationListener, InvalidationMessage, InvalidationReason,
	LoopbackCluster, NodeId,
};
pub use collab::{ApplicationStore, ContentTypes, DeviceResolver, SecurityOracle};
pub use config::ResolverConfig;
pub use content::{AccessScope, ContentHead};
pub use error::{ClusterError, ConfigError, StoreError, UnindexablePath};
pub use generation::{ContentEvent, Generation, GenerationManager};
pub use index::{IndexTree, NodeIndex, PathTokenizer, QueryPath, SegmentId, SegmentTable, Zone};
pub use permission::{Permission, PermissionSet};
pub use record::{ApplicationRecord, FieldValue, RecordFlags, RecordId};
pub use resolve::{ListingOrder, ResolvedApplication, Resolver};
pub use service::{ApplicationResolver, ApplicationResolverBuilder};

#[cfg(test)]
pub(crate) mod test_fixtures;
