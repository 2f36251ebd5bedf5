use std::collections::HashMap;

use txbuilder::{
    BoxError, CancellationToken, Script, Transaction, Unlocker, UnlockerGetter, UnlockerParams,
};

/// Unlocking script produced ahead of time by an external signer.
#[derive(Debug, Clone)]
pub struct PresignedUnlocker(Script);

impl Unlocker for PresignedUnlocker {
    async fn unlocking_script(
        &self,
        _ctx: &CancellationToken,
        _tx: &Transaction,
        _params: UnlockerParams,
    ) -> Result<Script, BoxError> {
        Ok(self.0.clone())
    }
}

/// Looks presigned unlocking scripts up by the locking script they spend.
#[derive(Debug, Clone, Default)]
pub struct PresignedTable {
    scripts: HashMap<Script, Script>,
}

impl PresignedTable {
    #[must_use]
    pub fn new(scripts: HashMap<Script, Script>) -> Self {
        Self { scripts }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl UnlockerGetter for PresignedTable {
    type Unlocker = PresignedUnlocker;

    async fn unlocker(
        &self,
        _ctx: &CancellationToken,
        locking_script: &Script,
    ) -> Result<PresignedUnlocker, BoxError> {
        self.scripts
            .get(locking_script)
            .cloned()
            .map(PresignedUnlocker)
            .ok_or_else(|| format!("no unlocking script for locking script {locking_script}").into())
    }
}
