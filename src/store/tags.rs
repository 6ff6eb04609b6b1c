//! Tag list <-> persisted scalar.
//!
//! Tags are stored as a JSON array in a nullable TEXT column. `None` maps to
//! SQL `NULL`; `Some(vec![])` maps to `"[]"`, so the two stay distinguishable
//! across a round-trip.

/// Persisted tag column could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("decode tags: {0}")]
pub struct TagCodecError(#[from] serde_json::Error);

/// Encode an optional tag list into the persisted column value.
pub fn encode(tags: Option<&[String]>) -> Option<String> {
    // Serializing a slice of strings cannot fail.
    tags.map(|t| serde_json::Value::from(t.to_vec()).to_string())
}

/// Decode a persisted column value. `NULL` and blank text both decode to `None`.
pub fn decode(raw: Option<&str>) -> Result<Option<Vec<String>>, TagCodecError> {
    let trimmed = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };
    let tags: Vec<String> = serde_json::from_str(trimmed)?;
    Ok(Some(tags))
}
