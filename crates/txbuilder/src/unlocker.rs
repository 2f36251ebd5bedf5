//! Unlocking orchestration.
//!
//! How an unlocking script is produced (local key, hardware device, remote custody) is up to
//! the [`Unlocker`] implementation; this module only decides which input gets signed, with
//! which sighash flags, and where the result goes.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BoxError, TxBuilderError};
use crate::script::Script;
use crate::sighash::SigHashFlags;
use crate::transaction::Transaction;

/// Which input to unlock and what the signature commits to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlockerParams {
    pub input_index: u32,
    /// Unset flags are replaced with [`SigHashFlags::ALL_FORK_ID`].
    pub sighash_flags: SigHashFlags,
}

/// Produces the unlocking script for one input.
///
/// The full transaction is passed in so implementations can build the sighash preimage;
/// it must already be in its final shape for the signature being made.
pub trait Unlocker {
    fn unlocking_script(
        &self,
        ctx: &CancellationToken,
        tx: &Transaction,
        params: UnlockerParams,
    ) -> impl Future<Output = Result<Script, BoxError>> + Send;
}

/// Resolves the [`Unlocker`] able to spend a given previous locking script.
pub trait UnlockerGetter {
    type Unlocker: Unlocker;

    fn unlocker(
        &self,
        ctx: &CancellationToken,
        locking_script: &Script,
    ) -> impl Future<Output = Result<Self::Unlocker, BoxError>> + Send;
}

impl Transaction {
    /// Place an unlocking script into the input at `index`.
    pub fn insert_unlocking_script(
        &mut self,
        index: u32,
        script: Script,
    ) -> Result<(), TxBuilderError> {
        let input = usize::try_from(index)
            .ok()
            .and_then(|i| self.inputs.get_mut(i))
            .ok_or(TxBuilderError::NoInputAtIndex { index })?;

        input.unlocking_script = Some(script);
        Ok(())
    }

    /// Unlock a single input with `unlocker`.
    ///
    /// Fails with [`TxBuilderError::NoUnlocker`] before doing anything when `unlocker` is
    /// `None`.
    pub async fn fill_input<U: Unlocker>(
        &mut self,
        ctx: &CancellationToken,
        unlocker: Option<&U>,
        params: UnlockerParams,
    ) -> Result<(), TxBuilderError> {
        let Some(unlocker) = unlocker else {
            return Err(TxBuilderError::NoUnlocker);
        };

        let params = UnlockerParams {
            sighash_flags: params.sighash_flags.or_default(),
            ..params
        };

        let script = tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(TxBuilderError::Cancelled),
            script = unlocker.unlocking_script(ctx, self, params) => {
                script.map_err(TxBuilderError::Unlocking)?
            }
        };

        self.insert_unlocking_script(params.input_index, script)
    }

    /// Unlock every input in ascending index order with `ALL|FORKID`.
    ///
    /// The first failure stops the walk; inputs unlocked before it keep their scripts.
    pub async fn fill_all_inputs<G: UnlockerGetter>(
        &mut self,
        ctx: &CancellationToken,
        getter: &G,
    ) -> Result<(), TxBuilderError> {
        for index in 0..self.inputs.len() {
            let input_index =
                u32::try_from(index).map_err(|_| TxBuilderError::InputIndexOverflow(index))?;
            let locking_script = self.inputs[index].previous_locking_script.clone();

            let unlocker = tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(TxBuilderError::Cancelled),
                unlocker = getter.unlocker(ctx, &locking_script) => {
                    unlocker.map_err(TxBuilderError::UnlockerResolution)?
                }
            };

            self.fill_input(
                ctx,
                Some(&unlocker),
                UnlockerParams {
                    input_index,
                    sighash_flags: SigHashFlags::ALL_FORK_ID,
                },
            )
            .await?;

            debug!(input_index, "input unlocked");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TxId, Utxo};

    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    /// Unlocking script: `[input index, sighash flags, inputs already unlocked]`.
    struct EchoUnlocker;

    impl Unlocker for EchoUnlocker {
        async fn unlocking_script(
            &self,
            _ctx: &CancellationToken,
            tx: &Transaction,
            params: UnlockerParams,
        ) -> Result<Script, BoxError> {
            let unlocked = tx.inputs().iter().filter(|i| i.is_unlocked()).count();
            Ok(Script::from_bytes(vec![
                u8::try_from(params.input_index)?,
                u8::try_from(params.sighash_flags.bits())?,
                u8::try_from(unlocked)?,
            ]))
        }
    }

    struct FailingUnlocker;

    impl Unlocker for FailingUnlocker {
        async fn unlocking_script(
            &self,
            _ctx: &CancellationToken,
            _tx: &Transaction,
            _params: UnlockerParams,
        ) -> Result<Script, BoxError> {
            Err("device rejected".into())
        }
    }

    /// Records every locking script it resolves and refuses the one in `refuse`.
    #[derive(Default)]
    struct RecordingGetter {
        seen: Mutex<Vec<Script>>,
        refuse: Option<Script>,
    }

    impl UnlockerGetter for RecordingGetter {
        type Unlocker = EchoUnlocker;

        async fn unlocker(
            &self,
            _ctx: &CancellationToken,
            locking_script: &Script,
        ) -> Result<EchoUnlocker, BoxError> {
            self.seen.lock().expect("lock").push(locking_script.clone());
            if self.refuse.as_ref() == Some(locking_script) {
                return Err("no key for script".into());
            }
            Ok(EchoUnlocker)
        }
    }

    fn locking_script(tag: u8) -> Script {
        Script::new_p2pkh(&[tag; 20])
    }

    fn tx_with_inputs(count: u8) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_utxos((0..count).map(|tag| Utxo {
            txid: TxId::from_byte_array([tag; 32]),
            vout: 0,
            satoshis: 1_000,
            locking_script: locking_script(tag),
        }));
        tx.pay_to_pubkey_hash(&[0xee; 20], 500);
        tx
    }

    #[test]
    fn insert_beyond_input_count_leaves_inputs_untouched() {
        let mut tx = tx_with_inputs(2);
        let before = tx.clone();

        let err = tx
            .insert_unlocking_script(2, Script::from_bytes(vec![0x51]))
            .expect_err("no such input");

        assert!(matches!(err, TxBuilderError::NoInputAtIndex { index: 2 }));
        assert_eq!(err.to_string(), "No input at index 2");
        assert_eq!(tx, before);
    }

    #[tokio::test]
    async fn fill_input_without_unlocker_fails_first() {
        let mut tx = tx_with_inputs(1);

        let err = tx
            .fill_input::<EchoUnlocker>(&CancellationToken::new(), None, UnlockerParams::default())
            .await
            .expect_err("no unlocker");

        assert!(matches!(err, TxBuilderError::NoUnlocker));
        assert!(!tx.inputs()[0].is_unlocked());
    }

    #[tokio::test]
    async fn fill_input_defaults_unset_flags() {
        let mut tx = tx_with_inputs(2);

        tx.fill_input(
            &CancellationToken::new(),
            Some(&EchoUnlocker),
            UnlockerParams {
                input_index: 1,
                sighash_flags: SigHashFlags::UNSET,
            },
        )
        .await
        .expect("filled");

        let script = tx.inputs()[1].unlocking_script.as_ref().expect("unlocked");
        assert_eq!(script.as_bytes(), &[1, 0x41, 0]);
        assert!(!tx.inputs()[0].is_unlocked());
    }

    #[tokio::test]
    async fn fill_input_keeps_explicit_flags() {
        let mut tx = tx_with_inputs(1);

        tx.fill_input(
            &CancellationToken::new(),
            Some(&EchoUnlocker),
            UnlockerParams {
                input_index: 0,
                sighash_flags: SigHashFlags::SINGLE_FORK_ID,
            },
        )
        .await
        .expect("filled");

        let script = tx.inputs()[0].unlocking_script.as_ref().expect("unlocked");
        assert_eq!(script.as_bytes(), &[0, 0x43, 0]);
    }

    #[tokio::test]
    async fn fill_input_at_missing_index_fails() {
        let mut tx = tx_with_inputs(1);

        let err = tx
            .fill_input(
                &CancellationToken::new(),
                Some(&EchoUnlocker),
                UnlockerParams {
                    input_index: 5,
                    sighash_flags: SigHashFlags::ALL_FORK_ID,
                },
            )
            .await
            .expect_err("missing input");

        assert!(matches!(err, TxBuilderError::NoInputAtIndex { index: 5 }));
    }

    #[tokio::test]
    async fn fill_input_propagates_unlocker_failure() {
        let mut tx = tx_with_inputs(1);

        let err = tx
            .fill_input(
                &CancellationToken::new(),
                Some(&FailingUnlocker),
                UnlockerParams::default(),
            )
            .await
            .expect_err("unlocker failure");

        assert!(matches!(err, TxBuilderError::Unlocking(ref e) if e.to_string() == "device rejected"));
        assert!(!tx.inputs()[0].is_unlocked());
    }

    #[tokio::test]
    async fn fill_all_inputs_walks_inputs_in_order() {
        let mut tx = tx_with_inputs(3);
        let getter = RecordingGetter::default();

        tx.fill_all_inputs(&CancellationToken::new(), &getter)
            .await
            .expect("all filled");

        let seen = getter.seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![locking_script(0), locking_script(1), locking_script(2)]);

        for (index, input) in tx.inputs().iter().enumerate() {
            let script = input.unlocking_script.as_ref().expect("unlocked");
            // Each unlocker saw every earlier input already unlocked.
            assert_eq!(script.as_bytes(), &[index as u8, 0x41, index as u8]);
        }
    }

    #[tokio::test]
    async fn fill_all_inputs_stops_at_first_resolution_failure() {
        let mut tx = tx_with_inputs(3);
        let getter = RecordingGetter {
            refuse: Some(locking_script(1)),
            ..Default::default()
        };

        let err = tx
            .fill_all_inputs(&CancellationToken::new(), &getter)
            .await
            .expect_err("resolution failure");

        assert!(matches!(err, TxBuilderError::UnlockerResolution(_)));
        assert_eq!(getter.seen.lock().expect("lock").len(), 2);
        assert!(tx.inputs()[0].is_unlocked());
        assert!(!tx.inputs()[1].is_unlocked());
        assert!(!tx.inputs()[2].is_unlocked());
    }

    #[tokio::test]
    async fn fill_all_inputs_honours_cancellation() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let mut tx = tx_with_inputs(2);
        let getter = RecordingGetter::default();

        let err = tx
            .fill_all_inputs(&ctx, &getter)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, TxBuilderError::Cancelled));
        assert!(getter.seen.lock().expect("lock").is_empty());
        assert!(tx.inputs().iter().all(|i| !i.is_unlocked()));
    }

    /// Unlocks input 0 and stalls on any later input after signalling `stalled`.
    #[derive(Clone)]
    struct StallAfterFirst {
        stalled: Arc<Notify>,
    }

    impl Unlocker for StallAfterFirst {
        async fn unlocking_script(
            &self,
            _ctx: &CancellationToken,
            _tx: &Transaction,
            params: UnlockerParams,
        ) -> Result<Script, BoxError> {
            if params.input_index == 0 {
                return Ok(Script::from_bytes(vec![0x51]));
            }
            self.stalled.notify_one();
            std::future::pending().await
        }
    }

    impl UnlockerGetter for StallAfterFirst {
        type Unlocker = Self;

        async fn unlocker(
            &self,
            _ctx: &CancellationToken,
            _locking_script: &Script,
        ) -> Result<Self, BoxError> {
            Ok(self.clone())
        }
    }

    #[tokio::test]
    async fn cancellation_mid_signing_keeps_earlier_signatures() {
        let ctx = CancellationToken::new();
        let stalled = Arc::new(Notify::new());
        let canceller = tokio::spawn({
            let ctx = ctx.clone();
            let stalled = Arc::clone(&stalled);
            async move {
                stalled.notified().await;
                ctx.cancel();
            }
        });

        let mut tx = tx_with_inputs(3);
        let err = tx
            .fill_all_inputs(&ctx, &StallAfterFirst { stalled })
            .await
            .expect_err("cancelled mid-signing");
        canceller.await.expect("canceller finished");

        assert!(matches!(err, TxBuilderError::Cancelled));
        assert!(tx.inputs()[0].is_unlocked());
        assert!(!tx.inputs()[1].is_unlocked());
        assert!(!tx.inputs()[2].is_unlocked());
    }
}
