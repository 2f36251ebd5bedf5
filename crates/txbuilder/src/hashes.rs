//! Hash primitives used by the preimage helpers and the public-key-hash scan.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA256 applied twice.
#[must_use]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// RIPEMD160 of the SHA256 of `data`, as committed to by P2PKH locking scripts.
#[must_use]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}
