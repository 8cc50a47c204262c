//! Conversion of application paths and queries into zoned segment sequences.
//!
//! Index time, `/Root/Sites/(apps)/Folder/Browse/iphone` becomes
//!
//! ```text
//! root sites | (apps) genericcontent folder | browse | iphone
//!    Path    |             Type             | Action | Device
//! ```
//!
//! with the type name expanded into its ancestry. The `This` pseudo-type is kept as a single
//! Type segment. Query time, the content path takes the place of the literal segments and the
//! content's own type ancestry takes the place of the type segment.

use smallvec::SmallVec;

use super::segment::{SegmentId, SegmentTable};
use super::tree::Zone;
use crate::collab::ContentTypes;
use crate::config::ResolverConfig;
use crate::content::{ContentHead, path_segments};
use crate::error::UnindexablePath;

/// Zoned form of an application path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedPath {
	pub segments: Vec<SegmentId>,
	/// Position of the apps marker; everything before it is a literal path segment.
	pub type_zone_start: usize,
	/// Position of the action segment.
	pub action_zone_start: usize,
}

impl TokenizedPath {
	/// Zone of the segment at `depth`.
	pub fn zone(&self, depth: usize) -> Zone {
		if depth < self.type_zone_start {
			Zone::Path
		} else if depth < self.action_zone_start {
			Zone::Type
		} else if depth == self.action_zone_start {
			Zone::Action
		} else {
			Zone::Device
		}
	}
}

/// Zoned form of a content item, without an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScope {
	/// Content path segments; `None` where the segment is unknown to the generation.
	pub path: Vec<Option<SegmentId>>,
	pub marker: SegmentId,
	pub this: Option<SegmentId>,
	/// Type ancestry, root-most first, cut at the first name the generation does not know.
	pub types: SmallVec<[SegmentId; 8]>,
	/// Known devices, most specific first.
	pub devices: SmallVec<[SegmentId; 4]>,
}

/// Zoned form of a single-action query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPath {
	pub scope: QueryScope,
	pub action: SegmentId,
}

pub struct PathTokenizer<'a> {
	config: &'a ResolverConfig,
	types: &'a dyn ContentTypes,
}

impl<'a> PathTokenizer<'a> {
	pub fn new(config: &'a ResolverConfig, types: &'a dyn ContentTypes) -> Self {
		Self { config, types }
	}

	/// Tokenizes an application path for insertion, interning every segment.
	///
	/// `action_name` replaces the literal action segment of the path. Nothing is interned when
	/// the path is rejected.
	pub fn tokenize_index(
		&self,
		table: &mut SegmentTable,
		path: &str,
		action_name: &str,
	) -> Result<TokenizedPath, UnindexablePath> {
		if action_name.trim().is_empty() {
			return Err(UnindexablePath::EmptyActionName);
		}
		let segments: Vec<&str> = path_segments(path).collect();
		let marker_at = segments
			.iter()
			.position(|s| s.eq_ignore_ascii_case(&self.config.apps_marker))
			.ok_or_else(|| UnindexablePath::MissingMarker {
				marker: self.config.apps_marker.clone(),
			})?;

		let scoped = &segments[marker_at + 1..];
		let type_name = scoped.first().ok_or(UnindexablePath::MissingType)?;
		let type_chain = if type_name.eq_ignore_ascii_case(&self.config.this_token) {
			vec![self.config.this_token.clone()]
		} else {
			match self.types.ancestry(type_name) {
				Some(chain) if !chain.is_empty() => chain,
				_ => return Err(UnindexablePath::UnknownType(type_name.to_string())),
			}
		};
		if scoped.len() < 2 {
			return Err(UnindexablePath::MissingAction);
		}
		let device = scoped.get(2);
		if scoped.len() > 3 {
			return Err(UnindexablePath::TrailingSegments(scoped.len() - 3));
		}

		let mut out = Vec::with_capacity(marker_at + type_chain.len() + 3);
		out.extend(segments[..marker_at].iter().map(|s| table.intern(s)));
		let type_zone_start = out.len();
		out.push(table.intern(&self.config.apps_marker));
		out.extend(type_chain.iter().map(|t| table.intern(t)));
		let action_zone_start = out.len();
		out.push(table.intern(action_name.trim()));
		if let Some(device) = device {
			out.push(table.intern(device));
		}

		Ok(TokenizedPath {
			segments: out,
			type_zone_start,
			action_zone_start,
		})
	}

	/// Tokenizes a content item and device chain against a built table.
	///
	/// Returns `None` when the generation holds no applications at all or the content type is
	/// unknown.
	pub fn tokenize_scope(
		&self,
		table: &SegmentTable,
		head: &ContentHead,
		devices: &[String],
	) -> Option<QueryScope> {
		let marker = table.get(&self.config.apps_marker)?;
		let ancestry = self.types.ancestry(&head.type_name)?;
		if ancestry.is_empty() {
			return None;
		}

		let path = head.segments().map(|s| table.get(s)).collect();
		let types = ancestry.iter().map_while(|t| table.get(t)).collect();
		let devices = devices.iter().filter_map(|d| table.get(d)).collect();

		Some(QueryScope {
			path,
			marker,
			this: table.get(&self.config.this_token),
			types,
			devices,
		})
	}

	/// Tokenizes a single-action query.
	///
	/// With no `action`, the configured default action is used. An action the generation does
	/// not know yields `None`.
	pub fn tokenize_query(
		&self,
		table: &SegmentTable,
		head: &ContentHead,
		action: Option<&str>,
		devices: &[String],
	) -> Option<QueryPath> {
		let action = action.unwrap_or(&self.config.default_action);
		let action = table.get(action.trim())?;
		let scope = self.tokenize_scope(table, head, devices)?;
		Some(QueryPath { scope, action })
	}
}

/// Derives the logical action name from an application path: the segment after the type.
pub fn derive_action_name(path: &str, config: &ResolverConfig) -> Option<String> {
	let mut segments = path_segments(path).skip_while(|s| !s.eq_ignore_ascii_case(&config.apps_marker));
	segments.next()?;
	segments.next()?;
	segments.next().map(str::to_string)
}
