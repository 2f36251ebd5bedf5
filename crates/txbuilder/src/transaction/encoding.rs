//! Legacy (non-segwit) wire layout, used for txids and fee sizing.
//!
//! Field encoding goes through `bitcoin`'s consensus codec; the layout itself is written
//! here because inputs carry an optional unlocking script and no witness.

use bitcoin::consensus::encode::{self, Decodable, Encodable, VarInt};
use bitcoin::io::{self, Read, Write};

use crate::error::TxBuilderError;
use crate::hashes::sha256d;
use crate::script::Script;
use crate::transaction::{Input, Output, Transaction, TxId};

/// Placeholder length for an input that has not been unlocked yet: a push of a
/// 72-byte DER signature with its sighash byte and a push of a 33-byte compressed key.
pub const P2PKH_UNLOCKING_SCRIPT_ESTIMATE: usize = 1 + 72 + 1 + 33;

// Same one-byte length prefix as the empty script written for an input not unlocked yet.
const _: () = assert!(P2PKH_UNLOCKING_SCRIPT_ESTIMATE < 0xfd);

fn encode_script<W: Write + ?Sized>(script: &[u8], w: &mut W) -> Result<usize, io::Error> {
    let len = VarInt::from(script.len()).consensus_encode(w)?;
    w.write_all(script)?;
    Ok(len + script.len())
}

impl Encodable for Transaction {
    fn consensus_encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, io::Error> {
        let mut len = self.version.consensus_encode(w)?;

        len += VarInt::from(self.inputs.len()).consensus_encode(w)?;
        for input in &self.inputs {
            len += input.previous_txid.as_bytes().consensus_encode(w)?;
            len += input.previous_output_index.consensus_encode(w)?;
            len += encode_script(
                input.unlocking_script.as_ref().map_or(&[][..], Script::as_bytes),
                w,
            )?;
            len += input.sequence_number.consensus_encode(w)?;
        }

        len += VarInt::from(self.outputs.len()).consensus_encode(w)?;
        for output in &self.outputs {
            len += output.satoshis.consensus_encode(w)?;
            len += encode_script(output.locking_script.as_bytes(), w)?;
        }

        len += self.lock_time.consensus_encode(w)?;
        Ok(len)
    }
}

impl Decodable for Transaction {
    fn consensus_decode_from_finite_reader<R: Read + ?Sized>(
        r: &mut R,
    ) -> Result<Self, encode::Error> {
        let version = u32::consensus_decode_from_finite_reader(r)?;

        let VarInt(input_count) = VarInt::consensus_decode_from_finite_reader(r)?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let previous_txid =
                TxId::from_byte_array(<[u8; 32]>::consensus_decode_from_finite_reader(r)?);
            let previous_output_index = u32::consensus_decode_from_finite_reader(r)?;
            let unlocking_script = Vec::<u8>::consensus_decode_from_finite_reader(r)?;
            let sequence_number = u32::consensus_decode_from_finite_reader(r)?;

            inputs.push(Input {
                previous_txid,
                previous_output_index,
                previous_satoshis: 0,
                previous_locking_script: Script::new(),
                sequence_number,
                unlocking_script: (!unlocking_script.is_empty())
                    .then(|| Script::from_bytes(unlocking_script)),
            });
        }

        let VarInt(output_count) = VarInt::consensus_decode_from_finite_reader(r)?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let satoshis = u64::consensus_decode_from_finite_reader(r)?;
            let locking_script = Vec::<u8>::consensus_decode_from_finite_reader(r)?;
            outputs.push(Output::new(satoshis, Script::from_bytes(locking_script)));
        }

        let lock_time = u32::consensus_decode_from_finite_reader(r)?;

        Ok(Self {
            version,
            lock_time,
            inputs,
            outputs,
        })
    }
}

impl Transaction {
    /// Serialize in the legacy wire layout. An input without an unlocking script is
    /// written with an empty one.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::serialize(self)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode the legacy wire layout, rejecting truncated data and trailing bytes.
    ///
    /// Decoded inputs carry no previous-output value or locking script, and an empty
    /// unlocking script decodes as "not unlocked".
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxBuilderError> {
        Ok(encode::deserialize(bytes)?)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TxBuilderError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Serialized size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Serialized size once every input is unlocked, counting inputs that are not unlocked
    /// yet as carrying [`P2PKH_UNLOCKING_SCRIPT_ESTIMATE`] bytes.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        let pending = self.inputs.iter().filter(|i| !i.is_unlocked()).count();
        self.size() + pending * P2PKH_UNLOCKING_SCRIPT_ESTIMATE
    }

    /// `sha256d` of the serialization.
    #[must_use]
    pub fn txid(&self) -> TxId {
        TxId::from_byte_array(sha256d(&self.to_bytes()))
    }
}
