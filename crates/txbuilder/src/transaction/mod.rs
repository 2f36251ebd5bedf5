//! Transaction record model.
//!
//! Inputs are append-only: once added, an input keeps its position, which is both the
//! index used for signing and its serialized position.

mod encoding;
mod input;
mod txid;

pub use encoding::P2PKH_UNLOCKING_SCRIPT_ESTIMATE;
pub use input::{DEFAULT_SEQUENCE_NUMBER, Input, Utxo};
pub use txid::TxId;

use serde::{Deserialize, Serialize};

use crate::error::TxBuilderError;
use crate::hashes::sha256d;
use crate::script::Script;

/// Destination of a transaction: an amount locked by a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub satoshis: u64,
    pub locking_script: Script,
}

impl Output {
    #[must_use]
    pub const fn new(satoshis: u64, locking_script: Script) -> Self {
        Self {
            satoshis,
            locking_script,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub lock_time: u32,
    pub(crate) inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: 1,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[must_use]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Mutable access to one input's fields, e.g. to override its sequence number.
    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.inputs.get_mut(index)
    }

    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
    }

    pub fn pay_to_pubkey_hash(&mut self, pubkey_hash: &[u8; 20], satoshis: u64) {
        self.add_output(Output::new(satoshis, Script::new_p2pkh(pubkey_hash)));
    }

    pub fn pay_to_script_hex(
        &mut self,
        locking_script: &str,
        satoshis: u64,
    ) -> Result<(), TxBuilderError> {
        let script = Script::from_hex(locking_script)?;
        self.add_output(Output::new(satoshis, script));
        Ok(())
    }

    pub fn total_input_satoshis(&self) -> Result<u64, TxBuilderError> {
        self.inputs.iter().try_fold(0u64, |total, input| {
            total
                .checked_add(input.previous_satoshis)
                .ok_or(TxBuilderError::AmountOverflow("summing input satoshis"))
        })
    }

    pub fn total_output_satoshis(&self) -> Result<u64, TxBuilderError> {
        self.outputs.iter().try_fold(0u64, |total, output| {
            total
                .checked_add(output.satoshis)
                .ok_or(TxBuilderError::AmountOverflow("summing output satoshis"))
        })
    }

    /// `sha256d` over every input's outpoint: txid bytes in wire order followed by the
    /// little-endian output index.
    #[must_use]
    pub fn previous_out_hash(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(self.inputs.len() * 36);

        for input in &self.inputs {
            buf.extend_from_slice(input.previous_txid.as_bytes());
            buf.extend_from_slice(&input.previous_output_index.to_le_bytes());
        }

        sha256d(&buf)
    }

    /// `sha256d` over every input's little-endian sequence number.
    #[must_use]
    pub fn sequence_hash(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(self.inputs.len() * 4);

        for input in &self.inputs {
            buf.extend_from_slice(&input.sequence_number.to_le_bytes());
        }

        sha256d(&buf)
    }
}
