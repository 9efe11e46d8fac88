//! Heuristic filtering of identifier values.
//!
//! Identifier tokens (part numbers and the like) never carry spaces, hyphens,
//! or colons. Cells under a header that do are stray notes, ranges, or
//! timestamps.

/// Characters that disqualify a normalized value.
const ILLEGAL_CHARS: [char; 3] = [' ', '-', ':'];

/// Marker for a secondary header row nested inside a table.
pub const SENTINEL: &str = "key";

/// Trims surrounding whitespace and lower-cases.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns true when the value is acceptable as an identifier.
pub fn is_valid(value: &str) -> bool {
    let normalized = normalize(value);
    !normalized.contains(ILLEGAL_CHARS)
}

/// Returns true for the nested-header sentinel.
pub fn is_sentinel(value: &str) -> bool {
    normalize(value) == SENTINEL
}
