//! State keys of transfer records.

const TRANSFER_FROM: &str = "/f/b/cct/from/";
const TRANSFER_TO: &str = "/f/b/cct/to/";

/// Prefix shared by every origin-side record.
pub fn from_prefix() -> &'static str {
    TRANSFER_FROM
}

/// Prefix shared by every destination-side record.
pub fn to_prefix() -> &'static str {
    TRANSFER_TO
}

pub fn from_key(id: &str) -> String {
    format!("{TRANSFER_FROM}{id}")
}

pub fn to_key(id: &str) -> String {
    format!("{TRANSFER_TO}{id}")
}
