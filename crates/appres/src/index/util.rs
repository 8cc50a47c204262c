/// Converts a record or node arena length into the handle of the next entry.
///
/// Generations are rebuilt from scratch, so overflow means a runaway application set.
///
/// # Panics
///
/// Panics if the arena has grown past `u32::MAX` entries.
pub(crate) fn u32_index(len: usize, arena: &'static str) -> u32 {
	u32::try_from(len).unwrap_or_else(|_| panic!("{arena} arena exceeds u32 handles ({len} entries)"))
}
