use parking_lot::Mutex;

use crate::sorting::common::error::Result;
use crate::sorting::snapshot::store::SnapshotStore;
use crate::sorting::stats::SessionStats;

/// Keeps the snapshot in memory only. Used when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<SessionStats>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(stats: SessionStats) -> Self {
        Self {
            snapshot: Mutex::new(Some(stats)),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, stats: &SessionStats) -> Result<()> {
        *self.snapshot.lock() = Some(stats.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionStats>> {
        Ok(self.snapshot.lock().clone())
    }
}
