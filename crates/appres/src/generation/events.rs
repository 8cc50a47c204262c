use crate::cluster::EventKind;
use crate::content::ContentHead;

/// A content-tree mutation reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
	Created {
		head: ContentHead,
	},
	/// Saved in place, or renamed/moved when `previous_path` is set.
	Modified {
		head: ContentHead,
		previous_path: Option<String>,
	},
	/// Moved to the trash.
	Deleted {
		head: ContentHead,
	},
	/// Removed permanently.
	Destroyed {
		head: ContentHead,
	},
}

impl ContentEvent {
	pub fn head(&self) -> &ContentHead {
		match self {
			Self::Created { head }
			| Self::Modified { head, .. }
			| Self::Deleted { head }
			| Self::Destroyed { head } => head,
		}
	}

	pub fn kind(&self) -> EventKind {
		match self {
			Self::Created { .. } => EventKind::Created,
			Self::Modified { .. } => EventKind::Modified,
			Self::Deleted { .. } => EventKind::Deleted,
			Self::Destroyed { .. } => EventKind::Destroyed,
		}
	}

	/// Paths whose subtrees may hold indexed applications affected by this event.
	pub(crate) fn affected_paths(&self) -> impl Iterator<Item = &str> {
		let previous = match self {
			Self::Modified { previous_path, .. } => previous_path.as_deref(),
			_ => None,
		};
		let current = match self {
			// A freshly created item cannot contain already indexed applications.
			Self::Created { .. } => None,
			_ => Some(self.head().path.as_str()),
		};
		current.into_iter().chain(previous)
	}
}
