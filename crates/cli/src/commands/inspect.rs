use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use txbuilder::Transaction;

/// Decode a raw transaction and print its identifiers and preimage digests
#[derive(Args, Debug)]
pub struct Inspect {
    /// Raw transaction hex
    tx_hex: String,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub txid: String,
    pub version: u32,
    pub lock_time: u32,
    pub size: usize,
    pub inputs: Vec<InspectInput>,
    pub outputs: Vec<InspectOutput>,
    pub previous_out_hash: String,
    pub sequence_hash: String,
}

#[derive(Debug, Serialize)]
pub struct InspectInput {
    pub previous_txid: String,
    pub previous_output_index: u32,
    pub sequence_number: u32,
    pub unlocking_script: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub satoshis: u64,
    pub locking_script: String,
    pub is_p2pkh: bool,
}

impl Inspect {
    pub fn handle(&self) -> Result<()> {
        let tx = Transaction::from_hex(self.tx_hex.trim()).context("invalid transaction hex")?;

        let report = InspectReport {
            txid: tx.txid().to_string(),
            version: tx.version,
            lock_time: tx.lock_time,
            size: tx.size(),
            inputs: tx
                .inputs()
                .iter()
                .map(|input| InspectInput {
                    previous_txid: input.previous_txid.to_string(),
                    previous_output_index: input.previous_output_index,
                    sequence_number: input.sequence_number,
                    unlocking_script: input.unlocking_script.as_ref().map(ToString::to_string),
                })
                .collect(),
            outputs: tx
                .outputs()
                .iter()
                .map(|output| InspectOutput {
                    satoshis: output.satoshis,
                    locking_script: output.locking_script.to_hex(),
                    is_p2pkh: output.locking_script.is_p2pkh(),
                })
                .collect(),
            previous_out_hash: hex::encode(tx.previous_out_hash()),
            sequence_hash: hex::encode(tx.sequence_hash()),
        };

        super::emit(&report, None)
    }
}
