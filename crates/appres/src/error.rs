//! Error types shared across the crate.
//!
//! None of these escape the resolution API. They surface through the collaborator traits, the
//! config loader, and the build diagnostics attached to each generation.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by an [`crate::ApplicationStore`].
#[derive(Debug, Error)]
pub enum StoreError {
	/// The store could not be reached or refused the query.
	#[error("application store unavailable: {0}")]
	Unavailable(String),

	/// A write-back for a single record was rejected.
	#[error("write rejected for content {id}: {reason}")]
	WriteRejected {
		/// Content id of the record being written.
		id: u64,
		/// Store-provided reason.
		reason: String,
	},
}

/// Reason an application path cannot be placed in the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnindexablePath {
	/// The path has no `(apps)` marker segment.
	#[error("no '{marker}' segment in path")]
	MissingMarker {
		/// Configured marker name.
		marker: String,
	},

	/// Nothing follows the marker.
	#[error("no type segment after the apps marker")]
	MissingType,

	/// The type segment names a content type the type collaborator does not know.
	#[error("unknown content type '{0}'")]
	UnknownType(String),

	/// No action segment follows the type segment.
	#[error("no action segment after the type segment")]
	MissingAction,

	/// The record has an empty logical action name.
	#[error("empty action name")]
	EmptyActionName,

	/// More segments follow the device segment.
	#[error("{0} unexpected segment(s) after the device segment")]
	TrailingSegments(usize),
}

/// Errors that can occur when loading [`crate::ResolverConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// TOML syntax or schema error.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A field parsed but holds an unusable value.
	#[error("invalid value for '{field}': {reason}")]
	Invalid {
		/// Offending field name.
		field: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

/// Failure to hand an invalidation message to the cluster transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
	/// The channel has been shut down.
	#[error("cluster channel closed")]
	Closed,

	/// Transport-level failure.
	#[error("cluster transport error: {0}")]
	Transport(String),
}
