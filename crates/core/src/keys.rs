//! Composite state keys.
//!
//! A composite key is `\0<object type>\0<attr>\0<attr>\0...`. The leading
//! NUL keeps composite keys apart from plain keys, and keys sharing an object
//! type form a contiguous range.

use crate::LedgerError;

const DELIMITER: char = '\u{0}';

/// Upper sentinel used to close a range query over a key prefix.
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Build a composite key from an object type and attributes.
pub fn composite_key(object_type: &str, attributes: &[&str]) -> Result<String, LedgerError> {
    validate_part(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(DELIMITER);
    key.push_str(object_type);
    key.push(DELIMITER);
    for attr in attributes {
        validate_part(attr)?;
        key.push_str(attr);
        key.push(DELIMITER);
    }
    Ok(key)
}

/// Split a composite key back into its object type and attributes.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), LedgerError> {
    let body = key
        .strip_prefix(DELIMITER)
        .ok_or_else(|| LedgerError::InvalidKey(format!("{key:?} is not a composite key")))?;
    let mut parts = body.split(DELIMITER);
    let object_type = parts.next().unwrap_or_default().to_string();
    let mut attributes: Vec<String> = parts.map(str::to_string).collect();
    // The trailing delimiter leaves one empty part.
    attributes.pop();
    Ok((object_type, attributes))
}

/// Key range `[start, end)` covering every key that starts with `prefix`.
pub fn prefix_range(prefix: &str) -> (String, String) {
    let mut end = prefix.to_string();
    end.push(MAX_UNICODE_RUNE);
    (prefix.to_string(), end)
}

fn validate_part(part: &str) -> Result<(), LedgerError> {
    if part.contains(DELIMITER) || part.contains(MAX_UNICODE_RUNE) {
        return Err(LedgerError::InvalidKey(format!(
            "{part:?} contains a reserved character"
        )));
    }
    Ok(())
}
