use std::borrow::Cow;

/// Minimal view of a content item, enough to tokenize a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHead {
	/// Repository content id.
	pub id: u64,
	/// Absolute repository path, `/`-separated.
	pub path: String,
	/// Name of the concrete content type.
	pub type_name: String,
}

impl ContentHead {
	pub fn new(id: u64, path: impl Into<String>, type_name: impl Into<String>) -> Self {
		Self {
			id,
			path: path.into(),
			type_name: type_name.into(),
		}
	}

	/// Returns the non-empty path segments in order.
	pub fn segments(&self) -> impl Iterator<Item = &str> {
		path_segments(&self.path)
	}
}

/// Identity under which a collaborator call runs.
///
/// Index builds and action-name write-backs always run [`AccessScope::Elevated`] so that the
/// index does not depend on who happened to trigger the rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessScope {
	/// The identity of the current caller.
	Caller,
	/// The system identity.
	Elevated,
}

pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|s| !s.is_empty())
}

/// Lower-cases a path and strips trailing separators, for prefix comparisons.
pub(crate) fn normalize_path(path: &str) -> String {
	let trimmed = path.trim_end_matches('/');
	trimmed.to_lowercase()
}

/// Lower-cases `s`, borrowing when it already is.
pub(crate) fn fold_case(s: &str) -> Cow<'_, str> {
	if s.chars().any(char::is_uppercase) {
		Cow::Owned(s.to_lowercase())
	} else {
		Cow::Borrowed(s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn segments_skip_empty_parts() {
		let head = ContentHead::new(1, "//Root/Sites//Intranet/", "Site");
		assert_eq!(head.segments().collect::<Vec<_>>(), ["Root", "Sites", "Intranet"]);
	}

	#[test]
	fn normalize_trims_and_folds() {
		assert_eq!(normalize_path("/Root/Apps/"), "/root/apps");
		assert_eq!(normalize_path("/"), "");
	}

	#[test]
	fn fold_case_borrows_lowercase_input() {
		assert!(matches!(fold_case("browse"), Cow::Borrowed(_)));
		assert_eq!(fold_case("Browse"), "browse");
	}
}
