pub mod fund;
pub mod inspect;

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

/// Print `value` as pretty JSON and optionally mirror it into `out`.
fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;

    if let Some(path) = out {
        std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("{rendered}");
    Ok(())
}
