use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TxBuilderError;
use crate::hashes::hash160;
use crate::script::Script;
use crate::transaction::{Transaction, TxId};

/// Finalised sequence number given to every newly added input.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A spendable previous output as described by a UTXO source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: TxId,
    pub vout: u32,
    pub satoshis: u64,
    pub locking_script: Script,
}

/// Transaction input together with the previous output data needed to fund and sign it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub previous_txid: TxId,
    pub previous_output_index: u32,
    /// Zero when the input was decoded from the wire.
    pub previous_satoshis: u64,
    /// Empty when the input was decoded from the wire.
    pub previous_locking_script: Script,
    pub sequence_number: u32,
    pub unlocking_script: Option<Script>,
}

impl Input {
    #[must_use]
    pub fn from_utxo(utxo: Utxo) -> Self {
        Self {
            previous_txid: utxo.txid,
            previous_output_index: utxo.vout,
            previous_satoshis: utxo.satoshis,
            previous_locking_script: utxo.locking_script,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
        }
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocking_script.is_some()
    }
}

impl From<Utxo> for Input {
    fn from(utxo: Utxo) -> Self {
        Self::from_utxo(utxo)
    }
}

impl Transaction {
    /// Add an input from explicit previous-output fields.
    ///
    /// `prev_txid` is the reversed-hex display form. Nothing is appended when either hex
    /// field fails to decode. The input gets [`DEFAULT_SEQUENCE_NUMBER`]; change it
    /// afterwards through [`Transaction::input_mut`] if needed.
    pub fn add_input_from(
        &mut self,
        prev_txid: &str,
        vout: u32,
        prev_locking_script: &str,
        satoshis: u64,
    ) -> Result<(), TxBuilderError> {
        let locking_script = Script::from_hex(prev_locking_script)?;
        let txid = TxId::from_display_hex(prev_txid)?;

        self.add_utxos([Utxo {
            txid,
            vout,
            satoshis,
            locking_script,
        }]);

        Ok(())
    }

    /// Append one input per UTXO, in iteration order.
    pub fn add_utxos(&mut self, utxos: impl IntoIterator<Item = Utxo>) {
        self.inputs.extend(utxos.into_iter().map(Input::from_utxo));
    }

    /// Add every output of `prev_tx` whose locking script pays to `hash160(public_key)`.
    ///
    /// The scan stops at the first output whose script carries no public key hash; inputs
    /// added for earlier outputs are kept.
    pub fn add_p2pkh_inputs_from_tx(
        &mut self,
        prev_tx: &Transaction,
        public_key: &[u8],
    ) -> Result<(), TxBuilderError> {
        let prev_txid = prev_tx.txid();
        let wanted = hash160(public_key);

        for (vout, output) in prev_tx.outputs.iter().enumerate() {
            if output.locking_script.public_key_hash()? != wanted {
                continue;
            }

            let vout = u32::try_from(vout).map_err(|_| TxBuilderError::InputIndexOverflow(vout))?;
            debug!(txid = %prev_txid, vout, satoshis = output.satoshis, "matched p2pkh output");

            self.add_utxos([Utxo {
                txid: prev_txid,
                vout,
                satoshis: output.satoshis,
                locking_script: output.locking_script.clone(),
            }]);
        }

        Ok(())
    }
}
