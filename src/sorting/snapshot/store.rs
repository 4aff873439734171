use crate::sorting::common::error::Result;
use crate::sorting::stats::SessionStats;

pub trait SnapshotStore: Send + Sync {
    /// Replaces the stored snapshot. Readers see either the old snapshot or
    /// the new one, never a partial write.
    fn save(&self, stats: &SessionStats) -> Result<()>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<SessionStats>>;
}
