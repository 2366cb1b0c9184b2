//! One-shot sync: probe, then one incremental fetch.

use anyhow::Result;
use picochat_client::{
    ClientConfig, CycleOutcome, HttpTransport, MemoryProbe, SyncEngine, SystemMemory, Transport,
};

use crate::render::{format_history, format_status};

/// Run the sync command.
pub fn run(config: &ClientConfig) -> Result<()> {
    let engine = SyncEngine::new(config, HttpTransport::new(config), SystemMemory::new());
    let engine = sync_twice(engine)?;

    print!("{}", format_history(engine.history()));
    println!("{}", format_status(engine.status()));
    Ok(())
}

/// Probe, then fetch once. Fails if either cycle did not complete.
fn sync_twice<T: Transport, M: MemoryProbe>(
    mut engine: SyncEngine<T, M>,
) -> Result<SyncEngine<T, M>> {
    for _ in 0..2 {
        match engine.run_sync_cycle() {
            CycleOutcome::Synced { phase, appended } => {
                tracing::info!(?phase, appended, "cycle complete");
            }
            CycleOutcome::Deferred => {}
            CycleOutcome::Skipped(error) | CycleOutcome::Failed { error, .. } => {
                anyhow::bail!("sync failed: {}", error);
            }
        }
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use picochat_client::{FixedMemory, MockTransport};

    fn engine(transport: &MockTransport) -> SyncEngine<MockTransport, FixedMemory> {
        let config = ClientConfig::new("https://hs", "!r:hs", "tok");
        SyncEngine::new(&config, transport.clone(), FixedMemory::new(1 << 20))
    }

    #[test]
    fn sync_twice_probes_then_fetches() {
        let transport = MockTransport::new();
        transport.queue_get(200, r#"{"next_batch":"s1"}"#);
        transport.queue_get(
            200,
            r#"{"next_batch":"s2","rooms":{"join":{"!r:hs":{"timeline":{"events":[
                {"type":"m.room.message","sender":"@a:hs","content":{"msgtype":"m.text","body":"hi"}}
            ]}}}}}"#,
        );

        let engine = sync_twice(engine(&transport)).unwrap();

        assert_eq!(engine.history().len(), 1);
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn sync_twice_reports_failure() {
        let transport = MockTransport::new();
        transport.queue_get(401, "{}");

        assert!(sync_twice(engine(&transport)).is_err());
    }
}
