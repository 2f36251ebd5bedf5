#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![cfg_attr(
    test,
    allow(
        clippy::cast_possible_truncation,
        clippy::default_trait_access,
        clippy::needless_pass_by_value,
        clippy::too_many_lines
    )
)]

//! Transaction assembly for UTXO chains.
//!
//! [`Transaction::fund`] pulls spendable outputs from a [`UtxoSource`] until the inputs cover
//! the outputs plus the fee estimated for the transaction's current shape, and
//! [`Transaction::fill_all_inputs`] walks every input asking an [`UnlockerGetter`] for the
//! capability that produces its unlocking script.
//!
//! Signing primitives, the sighash preimage algorithm and broadcasting live outside this crate;
//! they plug in through the [`Unlocker`] and [`UnlockerGetter`] traits.

pub mod error;
pub mod fees;
pub mod funding;
pub mod hashes;
pub mod script;
pub mod sighash;
pub mod transaction;
pub mod unlocker;

pub use error::{BoxError, TxBuilderError};
pub use fees::{FeeEstimator, FeeQuote};
pub use funding::{UtxoFetch, UtxoPool, UtxoSource};
pub use script::Script;
pub use sighash::SigHashFlags;
pub use transaction::{DEFAULT_SEQUENCE_NUMBER, Input, Output, Transaction, TxId, Utxo};
pub use unlocker::{Unlocker, UnlockerGetter, UnlockerParams};

pub use tokio_util::sync::CancellationToken;
