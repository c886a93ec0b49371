//! Identifier normalization
//!
//! Notion accepts object IDs both as hyphenated UUIDs and as 32 hex digits.
//! Callers copy IDs from URLs and API payloads in either form, so page and
//! block IDs are reduced to the bare form before use.

/// Strip every hyphen from an identifier.
pub fn normalize_id(id: &str) -> String {
    id.replace('-', "")
}

/// Normalize an optional identifier, treating an empty string as absent.
pub fn normalize_optional_id(id: Option<&str>) -> Option<String> {
    id.filter(|s| !s.is_empty()).map(normalize_id)
}
