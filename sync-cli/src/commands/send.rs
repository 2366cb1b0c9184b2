//! Send one message.

use anyhow::{Context, Result};
use picochat_client::{ClientConfig, HttpTransport, SyncEngine, SystemMemory};
use picochat_types::{truncate_chars, TransactionId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Run the send command.
pub fn run(config: &ClientConfig, text: &str) -> Result<()> {
    let text = truncate_chars(text.trim(), config.history.body_max_chars);
    if text.is_empty() {
        anyhow::bail!("Nothing to send");
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .context("System clock is before the Unix epoch")?;
    let txn = TransactionId::from_clock(now_ms, 1);

    let mut engine = SyncEngine::new(config, HttpTransport::new(config), SystemMemory::new());
    engine.send(&txn, text)?;

    println!("Sent ({})", txn);
    Ok(())
}
