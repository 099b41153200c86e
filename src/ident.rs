//! Sequential internal-id generation
//!
//! Internal ids have the shape `{prefix}{YY}{MM}{NNN}`: the category prefix,
//! the two-digit year and month, and a sequence number zero-padded to three
//! digits. The sequence is scoped to the month prefix and starts at 1; past
//! 999 it simply widens.

use chrono::{DateTime, Datelike, Utc};

/// Minimum width of the sequence suffix.
pub const SEQ_WIDTH: usize = 3;

/// The month-scoped prefix all ids of a category share, e.g. `PVT2608`.
pub fn month_prefix(prefix: &str, date: DateTime<Utc>) -> String {
    format!("{}{:02}{:02}", prefix, date.year() % 100, date.month())
}

/// Parse the sequence suffix of an id sharing `month_prefix`.
///
/// Returns `None` for ids of other prefixes and for malformed suffixes;
/// malformed ids are skipped, never errors.
pub fn parse_seq(month_prefix: &str, internal_id: &str) -> Option<u32> {
    internal_id.strip_prefix(month_prefix)?.parse().ok()
}

/// Highest sequence among `ids` sharing `month_prefix` (0 when none match).
pub fn max_seq<'a>(month_prefix: &str, ids: impl IntoIterator<Item = &'a str>) -> u32 {
    ids.into_iter()
        .filter_map(|id| parse_seq(month_prefix, id))
        .max()
        .unwrap_or(0)
}

/// Format a sequence number into a full internal id.
pub fn format_id(month_prefix: &str, seq: u32) -> String {
    format!("{}{:0width$}", month_prefix, seq, width = SEQ_WIDTH)
}

/// The next id after the given existing ids: `max + 1`, `…001` when empty.
pub fn next_from_existing<'a>(
    month_prefix: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> String {
    format_id(month_prefix, max_seq(month_prefix, ids) + 1)
}
