//! Domain-specific identifier types.

use crate::HexError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Transaction identifier.
///
/// Ledger transaction ids are binary; the hex form is used for state keys
/// and log output.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxId(pub Vec<u8>);

impl TxId {
    /// Parse a transaction id from its hex form.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        hex::decode(hex).map(TxId).map_err(|_| HexError::InvalidHex)
    }

    /// Hex form of the id.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Account address (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Size of an address in bytes.
    pub const BYTES: usize = 32;

    /// Create an address from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HexError> {
        if bytes.len() != Self::BYTES {
            return Err(HexError::InvalidLength {
                expected: Self::BYTES * 2,
                actual: bytes.len() * 2,
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Parse an address from its hex form.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        if hex.len() != Self::BYTES * 2 {
            return Err(HexError::InvalidLength {
                expected: Self::BYTES * 2,
                actual: hex.len(),
            });
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(hex, &mut arr).map_err(|_| HexError::InvalidHex)?;
        Ok(Self(arr))
    }

    /// Hex form of the address.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Address({}..)", &hex[..8])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Channel identifier.
///
/// A channel's id doubles as the base symbol of the token native to that
/// channel. Ids compare case-insensitively, so they are normalized to upper
/// case on construction.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id.
    pub fn new(id: impl AsRef<str>) -> Self {
        ChannelId(id.as_ref().to_ascii_uppercase())
    }

    /// Normalized id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `symbol` names this channel.
    pub fn is(&self, symbol: &str) -> bool {
        self.0.eq_ignore_ascii_case(symbol)
    }

    /// Whether `symbol` is exactly this channel's normalized id.
    pub fn is_exactly(&self, symbol: &str) -> bool {
        self.0 == symbol
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        ChannelId::new(value)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        ChannelId::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base symbol of a token name: the part before the first `_`.
///
/// `"VT_1"` and `"VT"` both belong to channel `VT`.
pub fn token_symbol(token: &str) -> &str {
    token.split('_').next().unwrap_or(token)
}
