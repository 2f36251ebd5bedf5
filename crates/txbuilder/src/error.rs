use thiserror::Error;

/// Error type returned by external collaborators (UTXO sources, fee estimators, unlockers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TxBuilderError {
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid txid length: expected 32 bytes, got {0}")]
    InvalidTxIdLength(usize),

    #[error("Transaction decode error: {0}")]
    Decode(#[from] bitcoin::consensus::encode::Error),

    #[error("Locking script does not carry a P2PKH public key hash: {0}")]
    NotP2pkh(String),

    /// The UTXO source ran dry while a deficit remained.
    #[error("Insufficient funds: {deficit} sat still required after the UTXO source was exhausted")]
    InsufficientFunds { deficit: u64 },

    #[error("Funding stopped after {rounds} rounds with {deficit} sat still required")]
    FundingRoundLimit { rounds: usize, deficit: u64 },

    #[error("No unlocker supplied")]
    NoUnlocker,

    #[error("No input at index {index}")]
    NoInputAtIndex { index: u32 },

    #[error("Input index {0} exceeds u32 maximum")]
    InputIndexOverflow(usize),

    #[error("Satoshi amount overflow while {0}")]
    AmountOverflow(&'static str),

    #[error("Fee estimation failed: {0}")]
    FeeEstimation(#[source] BoxError),

    #[error("UTXO source failed: {0}")]
    UtxoSource(#[source] BoxError),

    #[error("Unlocker resolution failed: {0}")]
    UnlockerResolution(#[source] BoxError),

    #[error("Unlocking script creation failed: {0}")]
    Unlocking(#[source] BoxError),

    #[error("Operation cancelled")]
    Cancelled,
}
