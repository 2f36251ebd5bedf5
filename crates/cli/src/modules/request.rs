use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use txbuilder::{Output, Script, Transaction, Utxo};

/// JSON description of the transaction to fund.
///
/// ```json
/// {
///   "inputs": [{ "txid": "..", "vout": 0, "locking_script": "76a9..88ac", "satoshis": 1000 }],
///   "p2pkh_sources": [{ "tx_hex": "0100..", "public_key": "02.." }],
///   "outputs": [{ "satoshis": 900, "locking_script": "76a9..88ac" }],
///   "utxos": [{ "txid": "..", "vout": 1, "satoshis": 5000, "locking_script": "76a9..88ac" }],
///   "unlocking_scripts": { "76a9..88ac": "4830..." }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundingRequest {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub lock_time: u32,
    /// Inputs known up front, added before funding.
    #[serde(default)]
    pub inputs: Vec<RequestInput>,
    /// Previous transactions scanned for outputs paying to a public key.
    #[serde(default)]
    pub p2pkh_sources: Vec<P2pkhSource>,
    pub outputs: Vec<Output>,
    /// Pool the funding loop draws from, in order.
    #[serde(default)]
    pub utxos: Vec<Utxo>,
    /// Locking script hex to unlocking script hex. When non-empty every input gets filled.
    #[serde(default)]
    pub unlocking_scripts: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestInput {
    pub txid: String,
    pub vout: u32,
    pub locking_script: String,
    pub satoshis: u64,
    #[serde(default)]
    pub sequence_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct P2pkhSource {
    pub tx_hex: String,
    pub public_key: String,
}

impl FundingRequest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("invalid funding request in {}", path.display()))
    }

    /// Transaction with the request's outputs and explicit inputs, ready for funding.
    pub fn build_transaction(&self) -> Result<Transaction> {
        let mut tx = Transaction::new();
        if let Some(version) = self.version {
            tx.version = version;
        }
        tx.lock_time = self.lock_time;

        for (position, input) in self.inputs.iter().enumerate() {
            tx.add_input_from(
                &input.txid,
                input.vout,
                &input.locking_script,
                input.satoshis,
            )
            .with_context(|| format!("inputs[{position}] is malformed"))?;

            if let Some(sequence) = input.sequence_number
                && let Some(added) = tx.input_mut(tx.input_count() - 1)
            {
                added.sequence_number = sequence;
            }
        }

        for (position, source) in self.p2pkh_sources.iter().enumerate() {
            let prev = Transaction::from_hex(&source.tx_hex)
                .with_context(|| format!("p2pkh_sources[{position}].tx_hex is malformed"))?;
            let public_key = hex::decode(&source.public_key)
                .with_context(|| format!("p2pkh_sources[{position}].public_key is not hex"))?;

            let before = tx.input_count();
            tx.add_p2pkh_inputs_from_tx(&prev, &public_key)
                .with_context(|| format!("p2pkh_sources[{position}] could not be scanned"))?;

            tracing::info!(
                txid = %prev.txid(),
                added = tx.input_count() - before,
                "scanned previous transaction"
            );
        }

        for output in &self.outputs {
            tx.add_output(output.clone());
        }

        Ok(tx)
    }

    /// Decoded `unlocking_scripts` table.
    pub fn unlocking_table(&self) -> Result<HashMap<Script, Script>> {
        self.unlocking_scripts
            .iter()
            .map(|(locking, unlocking)| {
                let locking = Script::from_hex(locking)
                    .with_context(|| format!("unlocking_scripts key {locking} is not hex"))?;
                let unlocking = Script::from_hex(unlocking)
                    .with_context(|| format!("unlocking script for {locking} is not hex"))?;
                Ok((locking, unlocking))
            })
            .collect()
    }
}
