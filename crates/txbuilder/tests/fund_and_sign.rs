use std::collections::HashMap;

use txbuilder::hashes::hash160;
use txbuilder::{
    BoxError, CancellationToken, FeeQuote, Script, Transaction, TxBuilderError, TxId, Unlocker,
    UnlockerGetter, UnlockerParams, Utxo, UtxoPool,
};

const PUBKEY_HEX: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// Hands back a prepared unlocking script, stamped with the sighash flag byte.
#[derive(Clone)]
struct PreparedUnlocker(Script);

impl Unlocker for PreparedUnlocker {
    async fn unlocking_script(
        &self,
        _ctx: &CancellationToken,
        _tx: &Transaction,
        params: UnlockerParams,
    ) -> Result<Script, BoxError> {
        let mut bytes = self.0.as_bytes().to_vec();
        bytes.push(u8::try_from(params.sighash_flags.bits())?);
        Ok(Script::from_bytes(bytes))
    }
}

struct PreparedUnlockers(HashMap<Script, PreparedUnlocker>);

impl UnlockerGetter for PreparedUnlockers {
    type Unlocker = PreparedUnlocker;

    async fn unlocker(
        &self,
        _ctx: &CancellationToken,
        locking_script: &Script,
    ) -> Result<PreparedUnlocker, BoxError> {
        self.0
            .get(locking_script)
            .cloned()
            .ok_or_else(|| format!("no unlocker for {locking_script}").into())
    }
}

fn previous_tx(owner: &[u8; 20]) -> Transaction {
    let mut tx = Transaction::new();
    tx.pay_to_pubkey_hash(owner, 3_000);
    tx.pay_to_pubkey_hash(&[0x99; 20], 7_000);
    tx.pay_to_pubkey_hash(owner, 2_000);
    tx
}

#[tokio::test]
async fn scan_fund_and_sign_produces_a_decodable_transaction() {
    let pubkey = hex::decode(PUBKEY_HEX).expect("pubkey hex");
    let owner = hash160(&pubkey);
    let prev = previous_tx(&owner);

    let mut tx = Transaction::new();
    tx.pay_to_pubkey_hash(&[0x42; 20], 8_000);

    tx.add_p2pkh_inputs_from_tx(&prev, &pubkey)
        .expect("scan previous tx");
    assert_eq!(tx.input_count(), 2);
    assert_eq!(tx.inputs()[0].previous_output_index, 0);
    assert_eq!(tx.inputs()[1].previous_output_index, 2);
    assert_eq!(tx.inputs()[1].previous_txid, prev.txid());

    let wallet_script = Script::new_p2pkh(&[0x55; 20]);
    let mut pool = UtxoPool::new((1..=3u8).map(|tag| Utxo {
        txid: TxId::from_byte_array([tag; 32]),
        vout: u32::from(tag),
        satoshis: 2_000,
        locking_script: wallet_script.clone(),
    }));

    let ctx = CancellationToken::new();
    let fees = FeeQuote::per_kilobyte(500);
    tx.fund_with_limit(&ctx, &fees, &mut pool, 10)
        .await
        .expect("funded");

    assert_eq!(tx.estimate_deficit(&fees).expect("deficit"), 0);
    assert_eq!(tx.input_count(), 4);
    assert_eq!(pool.len(), 1);

    let getter = PreparedUnlockers(HashMap::from([
        (
            Script::new_p2pkh(&owner),
            PreparedUnlocker(Script::from_bytes(vec![0xaa; 71])),
        ),
        (
            wallet_script,
            PreparedUnlocker(Script::from_bytes(vec![0xbb; 71])),
        ),
    ]));

    tx.fill_all_inputs(&ctx, &getter).await.expect("signed");

    for input in tx.inputs() {
        let script = input.unlocking_script.as_ref().expect("unlocked");
        assert_eq!(script.len(), 72);
        assert_eq!(script.as_bytes()[71], 0x41);
    }

    let decoded = Transaction::from_hex(&tx.to_hex()).expect("decode");
    assert_eq!(decoded.txid(), tx.txid());
    assert_eq!(decoded.previous_out_hash(), tx.previous_out_hash());
    assert_eq!(decoded.sequence_hash(), tx.sequence_hash());
}

#[tokio::test]
async fn unknown_locking_script_stops_signing() {
    let mut tx = Transaction::new();
    tx.add_input_from(
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
        0,
        "76a914000000000000000000000000000000000000000088ac",
        1_000,
    )
    .expect("add input");
    tx.pay_to_pubkey_hash(&[1; 20], 500);

    let getter = PreparedUnlockers(HashMap::new());
    let err = tx
        .fill_all_inputs(&CancellationToken::new(), &getter)
        .await
        .expect_err("no unlocker");

    assert!(matches!(err, TxBuilderError::UnlockerResolution(_)));
    assert!(!tx.inputs()[0].is_unlocked());
}
