use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TxBuilderError;

/// Transaction identifier.
///
/// Bytes are held in natural (wire) order: the order produced by `sha256d` over the
/// serialized transaction. The textual form is the conventional reversed hex used by
/// explorers and node RPCs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId([u8; 32]);

impl TxId {
    #[must_use]
    pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from natural-order bytes, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TxBuilderError> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TxBuilderError::InvalidTxIdLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Parse the reversed-hex display form.
    pub fn from_display_hex(hex_str: &str) -> Result<Self, TxBuilderError> {
        let mut bytes = hex::decode(hex_str)?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_display_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl FromStr for TxId {
    type Err = TxBuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display_hex(s)
    }
}

impl TryFrom<String> for TxId {
    type Error = TxBuilderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_display_hex(&value)
    }
}

impl From<TxId> for String {
    fn from(txid: TxId) -> Self {
        txid.to_display_hex()
    }
}
