use std::mem;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::resolved::{OverrideChain, ResolvedApplication};
use super::ZoneHit;
use crate::generation::Generation;
use crate::index::SegmentId;
use crate::record::RecordId;

/// Sort order for scenario listings.
///
/// Both orders sort by ascending `index` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingOrder {
	/// Ties broken by action name.
	#[default]
	ByName,
	/// Ties broken by display text (case-insensitive), then action name.
	ByText,
}

enum Slot {
	/// Cleared below the anchor at this position (0 is the deepest).
	Cleared { anchor: usize },
	/// Overrides still waiting for a wider base.
	Pending(OverrideChain),
	Resolved(RecordId, OverrideChain),
}

/// Per-action results across anchors, narrowest anchor first.
///
/// A `CLEAR` hides wider type levels only inside its own `(apps)` folder, including that folder's
/// `This` branch and type branch. A hit under a wider folder replaces the cleared entry, so a
/// listing may offer an action that [`super::Resolver::resolve_one`] reports as cleared.
#[derive(Default)]
pub(super) struct Accumulator {
	slots: FxHashMap<SegmentId, Slot>,
}

impl Accumulator {
	/// Starts a search for `action`, returning the chain to extend.
	///
	/// `None` when the action is already resolved by a narrower zone, or cleared under the same
	/// anchor.
	pub(super) fn open(&mut self, action: SegmentId, anchor: usize) -> Option<OverrideChain> {
		match self.slots.get_mut(&action) {
			Some(Slot::Resolved(..)) => None,
			Some(Slot::Cleared { anchor: cleared_at }) if *cleared_at == anchor => None,
			Some(Slot::Pending(chain)) => Some(mem::take(chain)),
			Some(Slot::Cleared { .. }) | None => Some(OverrideChain::new()),
		}
	}

	pub(super) fn settle(&mut self, action: SegmentId, anchor: usize, hit: ZoneHit, chain: OverrideChain) {
		let slot = match hit {
			ZoneHit::Found(base) => Slot::Resolved(base, chain),
			ZoneHit::Clear(_) => Slot::Cleared { anchor },
			ZoneHit::Exhausted if chain.is_empty() => return,
			ZoneHit::Exhausted => Slot::Pending(chain),
		};
		self.slots.insert(action, slot);
	}

	/// Drops cleared and unresolved entries.
	pub(super) fn finish(self, generation: &Arc<Generation>) -> Vec<ResolvedApplication> {
		self.slots
			.into_values()
			.filter_map(|slot| match slot {
				Slot::Resolved(base, chain) => Some(ResolvedApplication::new(Arc::clone(generation), base, chain)),
				Slot::Cleared { .. } | Slot::Pending(_) => None,
			})
			.collect()
	}
}
