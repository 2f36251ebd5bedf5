use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Defaults for the funding run, overridable through `TXBUILDER_*` environment variables
/// (or a `.env` file) and then through command-line flags.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub fee_sat_per_kb: u64,
    pub max_funding_rounds: usize,
    pub timeout_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_environment(environment())
    }

    fn from_environment(env: Environment) -> Result<Self> {
        let cfg = Config::builder()
            .set_default("fee_sat_per_kb", 50_i64)?
            .set_default("max_funding_rounds", 64_i64)?
            .set_default("timeout_ms", 30_000_i64)?
            .add_source(env)
            .build()?;

        cfg.try_deserialize()
            .context("TXBUILDER_* settings are malformed")
    }
}

/// `TXBUILDER_FEE_SAT_PER_KB` maps to `fee_sat_per_kb`; `__` separates nested keys.
fn environment() -> Environment {
    Environment::with_prefix("TXBUILDER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
