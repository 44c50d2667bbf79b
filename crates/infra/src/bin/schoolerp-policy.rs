//! Print the effective per-role policy summary as JSON.
//!
//! Reads the same environment as the service (`SCHOOLERP_POLICY_FILE`,
//! `SCHOOLERP_SCOPING`, ...), so a deployment can audit what it will enforce.

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    schoolerp_observability::init();

    let config = schoolerp_infra::config::load()?;
    let policy = config.policy_table();
    tracing::info!(
        scoping = ?config.scoping,
        entries = policy.entries().len(),
        "effective authorization policy"
    );

    let summary = serde_json::to_string_pretty(&policy.summarize())
        .context("serializing policy summary")?;
    println!("{summary}");
    Ok(())
}
