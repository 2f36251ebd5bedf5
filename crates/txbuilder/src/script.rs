//! Raw script bytes and the P2PKH template.
//!
//! Scripts are opaque to this crate except for the P2PKH layout, which is needed to
//! match previous outputs against a public key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TxBuilderError;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// `OP_DUP OP_HASH160 <20 bytes>` prefix length.
const P2PKH_HASH_END: usize = 23;
const P2PKH_LEN: usize = 25;

/// A locking or unlocking script, kept as raw bytes.
///
/// Serialized as lowercase hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Script(Vec<u8>);

impl Script {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TxBuilderError> {
        Ok(Self(hex::decode(hex_str)?))
    }

    /// Standard `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG` locking script.
    #[must_use]
    pub fn new_p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(P2PKH_LEN);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        bytes.extend_from_slice(pubkey_hash);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Exact 25-byte P2PKH template.
    #[must_use]
    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == P2PKH_LEN
            && self.0.starts_with(&[OP_DUP, OP_HASH160, OP_DATA_20])
            && self.0[P2PKH_HASH_END..] == [OP_EQUALVERIFY, OP_CHECKSIG]
    }

    /// Public key hash pushed by a script starting with `OP_DUP OP_HASH160 <20 bytes>`.
    ///
    /// Trailing data after the hash is not inspected, so P2PKH outputs carrying an
    /// appended `OP_RETURN` payload still yield their hash.
    pub fn public_key_hash(&self) -> Result<[u8; 20], TxBuilderError> {
        if self.0.len() < P2PKH_HASH_END || !self.0.starts_with(&[OP_DUP, OP_HASH160, OP_DATA_20])
        {
            return Err(TxBuilderError::NotP2pkh(self.to_hex()));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[3..P2PKH_HASH_END]);
        Ok(hash)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Script {
    type Err = TxBuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Script {
    type Error = TxBuilderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Script> for String {
    fn from(script: Script) -> Self {
        script.to_hex()
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
