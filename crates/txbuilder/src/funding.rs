//! Funding loop.
//!
//! [`Transaction::fund`] repeatedly:
//! 1. computes the deficit for the transaction's current shape,
//! 2. asks the [`UtxoSource`] for UTXOs covering it,
//! 3. appends everything returned as inputs.
//!
//! Adding inputs grows the transaction and with it the estimated fee, so the deficit is
//! recomputed after every batch instead of being decremented by the batch value.
//!
//! # Termination
//!
//! The loop ends when the deficit reaches zero or the source reports
//! [`UtxoFetch::Exhausted`]. A source that keeps returning batches that never close the
//! deficit keeps the loop running; [`Transaction::fund_with_limit`] bounds the number of
//! source calls for callers that cannot trust their source.

use std::collections::VecDeque;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{BoxError, TxBuilderError};
use crate::fees::FeeEstimator;
use crate::transaction::{Transaction, Utxo};

/// Result of one pull from a [`UtxoSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtxoFetch {
    Utxos(Vec<Utxo>),
    /// The source has nothing left to offer.
    Exhausted,
}

/// Pull-based provider of spendable outputs.
///
/// `deficit` is a hint of how many satoshis are still missing; the source may return more
/// or less than that.
pub trait UtxoSource {
    fn next_utxos(
        &mut self,
        ctx: &CancellationToken,
        deficit: u64,
    ) -> impl Future<Output = Result<UtxoFetch, BoxError>> + Send;
}

/// In-memory source handing out UTXOs in insertion order.
///
/// Each call returns the shortest prefix of the remaining UTXOs whose value reaches the
/// requested deficit (or everything left), and [`UtxoFetch::Exhausted`] once empty.
#[derive(Debug, Clone, Default)]
pub struct UtxoPool {
    utxos: VecDeque<Utxo>,
}

impl UtxoPool {
    #[must_use]
    pub fn new(utxos: impl IntoIterator<Item = Utxo>) -> Self {
        Self {
            utxos: utxos.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// UTXOs not handed out yet.
    pub fn remaining(&self) -> impl Iterator<Item = &Utxo> {
        self.utxos.iter()
    }
}

impl UtxoSource for UtxoPool {
    async fn next_utxos(
        &mut self,
        _ctx: &CancellationToken,
        deficit: u64,
    ) -> Result<UtxoFetch, BoxError> {
        if self.utxos.is_empty() {
            return Ok(UtxoFetch::Exhausted);
        }

        let mut batch = Vec::new();
        let mut covered = 0u64;
        while covered < deficit {
            let Some(utxo) = self.utxos.pop_front() else {
                break;
            };
            covered = covered.saturating_add(utxo.satoshis);
            batch.push(utxo);
        }

        Ok(UtxoFetch::Utxos(batch))
    }
}

impl Transaction {
    /// Add inputs from `source` until they cover all outputs plus the estimated fee.
    ///
    /// Outputs must already be in place. Exhaustion of the source with a deficit left fails
    /// with [`TxBuilderError::InsufficientFunds`]; any other source failure is returned as
    /// [`TxBuilderError::UtxoSource`] without further additions.
    pub async fn fund<F, S>(
        &mut self,
        ctx: &CancellationToken,
        fees: &F,
        source: &mut S,
    ) -> Result<(), TxBuilderError>
    where
        F: FeeEstimator + ?Sized,
        S: UtxoSource,
    {
        self.run_funding(ctx, fees, source, None).await
    }

    /// [`Transaction::fund`] with at most `max_rounds` calls to `source`.
    ///
    /// Fails with [`TxBuilderError::FundingRoundLimit`] when the deficit is still open after
    /// the last allowed round.
    pub async fn fund_with_limit<F, S>(
        &mut self,
        ctx: &CancellationToken,
        fees: &F,
        source: &mut S,
        max_rounds: usize,
    ) -> Result<(), TxBuilderError>
    where
        F: FeeEstimator + ?Sized,
        S: UtxoSource,
    {
        self.run_funding(ctx, fees, source, Some(max_rounds)).await
    }

    async fn run_funding<F, S>(
        &mut self,
        ctx: &CancellationToken,
        fees: &F,
        source: &mut S,
        max_rounds: Option<usize>,
    ) -> Result<(), TxBuilderError>
    where
        F: FeeEstimator + ?Sized,
        S: UtxoSource,
    {
        let mut deficit = self.estimate_deficit(fees)?;
        let mut rounds = 0usize;

        while deficit != 0 {
            if let Some(limit) = max_rounds
                && rounds >= limit
            {
                return Err(TxBuilderError::FundingRoundLimit { rounds, deficit });
            }
            rounds += 1;

            debug!(round = rounds, deficit, inputs = self.input_count(), "requesting utxos");

            let fetched = tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(TxBuilderError::Cancelled),
                fetched = source.next_utxos(ctx, deficit) => {
                    fetched.map_err(TxBuilderError::UtxoSource)?
                }
            };

            match fetched {
                UtxoFetch::Exhausted => {
                    debug!(round = rounds, deficit, "utxo source exhausted");
                    break;
                }
                UtxoFetch::Utxos(utxos) => {
                    if utxos.is_empty() {
                        warn!(round = rounds, deficit, "utxo source returned an empty batch");
                    }
                    self.add_utxos(utxos);
                }
            }

            deficit = self.estimate_deficit(fees)?;
        }

        if deficit != 0 {
            return Err(TxBuilderError::InsufficientFunds { deficit });
        }

        info!(
            rounds,
            inputs = self.input_count(),
            input_satoshis = self.total_input_satoshis()?,
            "transaction funded"
        );

        Ok(())
    }
}
