//! Fee estimation and the funding deficit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BoxError, TxBuilderError};
use crate::transaction::Transaction;

/// Returns the minimum fee, in satoshis, a transaction of the given shape must pay.
pub trait FeeEstimator {
    fn estimate_fee(&self, tx: &Transaction) -> Result<u64, BoxError>;
}

impl<T: FeeEstimator + ?Sized> FeeEstimator for &T {
    fn estimate_fee(&self, tx: &Transaction) -> Result<u64, BoxError> {
        (**self).estimate_fee(tx)
    }
}

#[derive(Debug, Error)]
pub enum FeeQuoteError {
    #[error("fee quote byte unit must be > 0")]
    ZeroByteUnit,

    #[error("fee overflow for {size} bytes at {satoshis} sat per {bytes} bytes")]
    Overflow { size: usize, satoshis: u64, bytes: u64 },
}

/// Flat rate of `satoshis` per `bytes` applied to [`Transaction::estimated_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub satoshis: u64,
    pub bytes: u64,
}

impl Default for FeeQuote {
    fn default() -> Self {
        Self::per_kilobyte(50)
    }
}

impl FeeQuote {
    #[must_use]
    pub const fn new(satoshis: u64, bytes: u64) -> Self {
        Self { satoshis, bytes }
    }

    #[must_use]
    pub const fn per_kilobyte(satoshis: u64) -> Self {
        Self::new(satoshis, 1000)
    }

    /// Fee for `size` bytes, rounded up.
    pub fn fee_for_size(&self, size: usize) -> Result<u64, FeeQuoteError> {
        if self.bytes == 0 {
            return Err(FeeQuoteError::ZeroByteUnit);
        }

        let overflow = || FeeQuoteError::Overflow {
            size,
            satoshis: self.satoshis,
            bytes: self.bytes,
        };

        u64::try_from(size)
            .ok()
            .and_then(|size| size.checked_mul(self.satoshis))
            .map(|scaled| scaled.div_ceil(self.bytes))
            .ok_or_else(overflow)
    }
}

impl FeeEstimator for FeeQuote {
    fn estimate_fee(&self, tx: &Transaction) -> Result<u64, BoxError> {
        Ok(self.fee_for_size(tx.estimated_size())?)
    }
}

impl Transaction {
    /// Satoshis still needed to cover all outputs plus the fee for the current shape,
    /// or zero once the inputs already cover it.
    ///
    /// Computed from scratch on every call.
    pub fn estimate_deficit<F: FeeEstimator + ?Sized>(
        &self,
        fees: &F,
    ) -> Result<u64, TxBuilderError> {
        let fee = fees
            .estimate_fee(self)
            .map_err(TxBuilderError::FeeEstimation)?;

        let required = self
            .total_output_satoshis()?
            .checked_add(fee)
            .ok_or(TxBuilderError::AmountOverflow("adding the fee to output satoshis"))?;

        Ok(required.saturating_sub(self.total_input_satoshis()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use crate::transaction::{TxId, Utxo};

    struct FixedFee(u64);

    impl FeeEstimator for FixedFee {
        fn estimate_fee(&self, _tx: &Transaction) -> Result<u64, BoxError> {
            Ok(self.0)
        }
    }

    struct BrokenFees;

    impl FeeEstimator for BrokenFees {
        fn estimate_fee(&self, _tx: &Transaction) -> Result<u64, BoxError> {
            Err("fee service unavailable".into())
        }
    }

    fn funded(satoshis: u64) -> Transaction {
        let mut tx = Transaction::new();
        tx.pay_to_pubkey_hash(&[1; 20], 1_000);
        tx.add_utxos([Utxo {
            txid: TxId::from_byte_array([2; 32]),
            vout: 0,
            satoshis,
            locking_script: Script::new_p2pkh(&[3; 20]),
        }]);
        tx
    }

    #[test]
    fn fee_quote_rounds_up() {
        let quote = FeeQuote::per_kilobyte(50);

        assert_eq!(quote.fee_for_size(0).expect("fee"), 0);
        assert_eq!(quote.fee_for_size(1).expect("fee"), 1);
        assert_eq!(quote.fee_for_size(191).expect("fee"), 10);
        assert_eq!(quote.fee_for_size(200).expect("fee"), 10);
        assert_eq!(quote.fee_for_size(201).expect("fee"), 11);
    }

    #[test]
    fn fee_quote_rejects_zero_unit() {
        let err = FeeQuote::new(1, 0).fee_for_size(10).expect_err("zero unit");
        assert!(matches!(err, FeeQuoteError::ZeroByteUnit));
    }

    #[test]
    fn fee_quote_uses_estimated_size() {
        let tx = funded(2_000);
        let fee = FeeQuote::new(1, 1).estimate_fee(&tx).expect("fee");

        assert_eq!(fee, tx.estimated_size() as u64);
    }

    #[test]
    fn deficit_covers_outputs_and_fee() {
        let tx = funded(600);
        assert_eq!(tx.estimate_deficit(&FixedFee(100)).expect("deficit"), 500);
    }

    #[test]
    fn deficit_clamps_to_zero_when_overfunded() {
        let tx = funded(5_000);
        assert_eq!(tx.estimate_deficit(&FixedFee(100)).expect("deficit"), 0);
    }

    #[test]
    fn deficit_propagates_fee_estimation_failure() {
        let tx = funded(600);

        let err = tx.estimate_deficit(&BrokenFees).expect_err("fee failure");
        assert!(
            matches!(err, TxBuilderError::FeeEstimation(ref inner) if inner.to_string() == "fee service unavailable")
        );
    }
}
