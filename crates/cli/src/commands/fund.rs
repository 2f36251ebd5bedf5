use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;
use txbuilder::{CancellationToken, FeeQuote, Transaction, UtxoPool};

use crate::modules::request::FundingRequest;
use crate::modules::settings::Settings;
use crate::modules::unlockers::PresignedTable;

/// Fund a request from its UTXO pool and, when unlocking scripts are supplied, fill every input
#[derive(Args, Debug)]
pub struct Fund {
    /// Path to the JSON funding request
    #[arg(long = "request", env = "TXBUILDER_REQUEST")]
    request: PathBuf,
    /// Fee rate in satoshis per 1000 bytes
    #[arg(long = "fee-sat-per-kb")]
    fee_sat_per_kb: Option<u64>,
    /// Maximum number of calls to the UTXO pool
    #[arg(long = "max-rounds")]
    max_rounds: Option<usize>,
    /// Give up after this many milliseconds
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,
    /// Also write the report to this file
    #[arg(long = "out")]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FundingReport {
    pub txid: String,
    pub tx_hex: String,
    pub size: usize,
    pub estimated_size: usize,
    pub input_count: usize,
    pub output_count: usize,
    pub total_input_satoshis: u64,
    pub total_output_satoshis: u64,
    pub fee: u64,
    pub unlocked_inputs: usize,
    pub unspent_pool_utxos: usize,
    pub previous_out_hash: String,
    pub sequence_hash: String,
}

impl FundingReport {
    fn new(tx: &Transaction, pool: &UtxoPool) -> Result<Self> {
        let total_input_satoshis = tx.total_input_satoshis()?;
        let total_output_satoshis = tx.total_output_satoshis()?;

        Ok(Self {
            txid: tx.txid().to_string(),
            tx_hex: tx.to_hex(),
            size: tx.size(),
            estimated_size: tx.estimated_size(),
            input_count: tx.input_count(),
            output_count: tx.output_count(),
            total_input_satoshis,
            total_output_satoshis,
            fee: total_input_satoshis.saturating_sub(total_output_satoshis),
            unlocked_inputs: tx.inputs().iter().filter(|i| i.is_unlocked()).count(),
            unspent_pool_utxos: pool.len(),
            previous_out_hash: hex::encode(tx.previous_out_hash()),
            sequence_hash: hex::encode(tx.sequence_hash()),
        })
    }
}

impl Fund {
    pub async fn handle(self, settings: &Settings) -> Result<()> {
        let request = FundingRequest::from_file(&self.request)?;
        let mut tx = request.build_transaction()?;
        let unlockers = PresignedTable::new(request.unlocking_table()?);
        let mut pool = UtxoPool::new(request.utxos);

        let fees = FeeQuote::per_kilobyte(self.fee_sat_per_kb.unwrap_or(settings.fee_sat_per_kb));
        let max_rounds = self.max_rounds.unwrap_or(settings.max_funding_rounds);
        let timeout = Duration::from_millis(self.timeout_ms.unwrap_or(settings.timeout_ms));

        let ctx = CancellationToken::new();
        let deadline = tokio::spawn({
            let ctx = ctx.clone();
            async move {
                tokio::time::sleep(timeout).await;
                ctx.cancel();
            }
        });

        let outcome = run(&ctx, &mut tx, &fees, &mut pool, max_rounds, &unlockers).await;
        deadline.abort();
        outcome?;

        let report = FundingReport::new(&tx, &pool)?;
        info!(
            txid = %report.txid,
            inputs = report.input_count,
            fee = report.fee,
            "transaction funded"
        );

        super::emit(&report, self.out.as_deref())
    }
}

async fn run(
    ctx: &CancellationToken,
    tx: &mut Transaction,
    fees: &FeeQuote,
    pool: &mut UtxoPool,
    max_rounds: usize,
    unlockers: &PresignedTable,
) -> Result<()> {
    tx.fund_with_limit(ctx, fees, pool, max_rounds)
        .await
        .context("funding failed")?;

    if unlockers.is_empty() {
        info!("no unlocking scripts supplied; leaving inputs unsigned");
        return Ok(());
    }

    tx.fill_all_inputs(ctx, unlockers)
        .await
        .context("filling inputs failed")
}
