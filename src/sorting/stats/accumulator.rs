use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::sorting::classify::{Category, ClassificationResult};
use crate::sorting::common::error::{Result, SortError};
use crate::sorting::snapshot::SnapshotStore;
use crate::sorting::stats::types::SessionStats;

/// Result of a mutation: the stats as they now stand in memory, plus the
/// snapshot write error if persisting them failed. A failed write does not
/// roll the update back; the next successful write includes it.
#[derive(Debug)]
pub struct StatsUpdate {
    pub stats: SessionStats,
    pub persist_error: Option<SortError>,
}

impl StatsUpdate {
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_result(self) -> Result<SessionStats> {
        match self.persist_error {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }
}

pub struct StatsAccumulator<S: SnapshotStore> {
    stats: Mutex<SessionStats>,
    store: S,
}

impl<S: SnapshotStore> StatsAccumulator<S> {
    /// Starts a fresh session without reading the store.
    pub fn new(store: S) -> Self {
        Self {
            stats: Mutex::new(SessionStats::default()),
            store,
        }
    }

    /// Resumes from the store's snapshot. A missing snapshot starts a fresh
    /// session, as does an unreadable one (logged).
    pub fn restore(store: S) -> Self {
        let loaded = store
            .load()
            .and_then(|snapshot| match snapshot {
                Some(mut stats) => stats.normalize().map(|()| Some(stats)),
                None => Ok(None),
            });

        let stats = match loaded {
            Ok(Some(stats)) => {
                info!(
                    total = stats.total_scanned,
                    pure = stats.pure_count,
                    blend = stats.blend_count,
                    "Restored session from snapshot"
                );
                stats
            }
            Ok(None) => SessionStats::default(),
            Err(e) => {
                warn!(error = %e, "Snapshot unreadable, starting a fresh session");
                SessionStats::default()
            }
        };

        Self {
            stats: Mutex::new(stats),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record_scan(&self, result: &ClassificationResult) -> StatsUpdate {
        let mut stats = self.stats.lock();

        stats.total_scanned = stats.total_scanned.saturating_add(1);
        match result.category {
            Category::Pure => stats.pure_count = stats.pure_count.saturating_add(1),
            Category::Blend => stats.blend_count = stats.blend_count.saturating_add(1),
        }
        let n = stats.total_scanned as f64;
        let avg = stats.running_purity_average;
        stats.running_purity_average = avg + (result.purity_percent - avg) / n;
        stats.last_result = Some(result.clone());
        stats.last_updated = Some(Utc::now());

        self.persist(&stats)
    }

    /// A consistent copy; never observes a half-applied update.
    pub fn current_stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    pub fn reset(&self) -> StatsUpdate {
        let mut stats = self.stats.lock();
        *stats = SessionStats {
            last_updated: Some(Utc::now()),
            ..SessionStats::default()
        };
        info!("Session statistics reset");

        self.persist(&stats)
    }

    // Called with the lock held so snapshots are written in update order.
    fn persist(&self, stats: &SessionStats) -> StatsUpdate {
        let persist_error = match self.store.save(stats) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, total = stats.total_scanned, "Snapshot write failed, keeping in-memory stats");
                Some(e)
            }
        };

        StatsUpdate {
            stats: stats.clone(),
            persist_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::sorting::snapshot::MemoryStore;

    /// Store whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        failing: AtomicBool,
        inner: MemoryStore,
    }

    impl SnapshotStore for FlakyStore {
        fn save(&self, stats: &SessionStats) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SortError::Persistence("disk unavailable".to_string()));
            }
            self.inner.save(stats)
        }

        fn load(&self) -> Result<Option<SessionStats>> {
            self.inner.load()
        }
    }

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn save(&self, _stats: &SessionStats) -> Result<()> {
            Ok(())
        }

        fn load(&self) -> Result<Option<SessionStats>> {
            Err(SortError::Persistence("corrupt".to_string()))
        }
    }

    fn result(category: Category, purity: f64) -> ClassificationResult {
        ClassificationResult::new(category, purity)
    }

    #[test]
    fn test_record_updates_counts_and_last_result() {
        let acc = StatsAccumulator::new(MemoryStore::new());

        acc.record_scan(&result(Category::Pure, 90.0));
        let update = acc.record_scan(&result(Category::Blend, 40.0));

        assert!(update.is_persisted());
        assert_eq!(update.stats.total_scanned, 2);
        assert_eq!(update.stats.pure_count, 1);
        assert_eq!(update.stats.blend_count, 1);
        assert_abs_diff_eq!(update.stats.running_purity_average, 65.0, epsilon = 1e-9);
        assert_eq!(update.stats.last_result, Some(result(Category::Blend, 40.0)));
        assert!(update.stats.last_updated.is_some());
        assert_eq!(acc.store().load().unwrap(), Some(update.stats));
    }

    #[test]
    fn test_running_average_matches_mean() {
        for n in [0usize, 1, 7, 250, 1000] {
            let acc = StatsAccumulator::new(MemoryStore::new());
            let mut sum = 0.0;
            for i in 0..n {
                // Deterministic spread over [0, 100]
                let purity = ((i * 37 + 11) % 1001) as f64 / 10.0;
                sum += purity;
                let category = if i % 3 == 0 { Category::Blend } else { Category::Pure };
                acc.record_scan(&result(category, purity));
            }

            let stats = acc.current_stats();
            let mean = if n == 0 { 0.0 } else { sum / n as f64 };
            assert_eq!(stats.total_scanned, n as u64);
            assert_eq!(stats.pure_count + stats.blend_count, stats.total_scanned);
            assert_abs_diff_eq!(stats.running_purity_average, mean, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let acc = StatsAccumulator::new(MemoryStore::new());
        acc.record_scan(&result(Category::Pure, 70.0));

        acc.reset();
        let again = acc.reset();

        assert!(again.is_persisted());
        let stats = acc.current_stats();
        assert_eq!(stats.total_scanned, 0);
        assert_eq!(stats.pure_count, 0);
        assert_eq!(stats.blend_count, 0);
        assert_eq!(stats.running_purity_average, 0.0);
        assert!(stats.last_result.is_none());
        assert_eq!(acc.store().load().unwrap().unwrap().total_scanned, 0);
    }

    #[test]
    fn test_failed_write_keeps_in_memory_update() {
        let acc = StatsAccumulator::new(FlakyStore::default());
        acc.record_scan(&result(Category::Pure, 80.0));

        acc.store().failing.store(true, Ordering::SeqCst);
        let update = acc.record_scan(&result(Category::Blend, 30.0));
        assert!(update.persist_error.as_ref().is_some_and(SortError::is_persistence));
        assert_eq!(update.stats.total_scanned, 2);
        assert_eq!(acc.current_stats().total_scanned, 2);
        assert_eq!(acc.store().load().unwrap().unwrap().total_scanned, 1);

        // The next successful write carries the missed update.
        acc.store().failing.store(false, Ordering::SeqCst);
        let update = acc.record_scan(&result(Category::Pure, 90.0));
        assert!(update.is_persisted());
        assert_eq!(acc.store().load().unwrap().unwrap().total_scanned, 3);
    }

    #[test]
    fn test_into_result_surfaces_persistence_error() {
        let store = FlakyStore::default();
        store.failing.store(true, Ordering::SeqCst);
        let acc = StatsAccumulator::new(store);

        let err = acc.reset().into_result().unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_restore_resumes_session() {
        let previous = SessionStats {
            total_scanned: 4,
            pure_count: 3,
            blend_count: 1,
            running_purity_average: 50.0,
            ..SessionStats::default()
        };
        let acc = StatsAccumulator::restore(MemoryStore::with_snapshot(previous));

        let update = acc.record_scan(&result(Category::Pure, 100.0));
        assert_eq!(update.stats.total_scanned, 5);
        assert_eq!(update.stats.pure_count, 4);
        assert_abs_diff_eq!(update.stats.running_purity_average, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_restore_from_unreadable_snapshot_starts_fresh() {
        let acc = StatsAccumulator::restore(BrokenStore);
        assert_eq!(acc.current_stats(), SessionStats::default());
    }

    #[test]
    fn test_restore_with_overflowing_counters_starts_fresh() {
        let corrupt = SessionStats {
            total_scanned: 0,
            pure_count: u64::MAX,
            blend_count: 1,
            ..SessionStats::default()
        };
        let acc = StatsAccumulator::restore(MemoryStore::with_snapshot(corrupt));
        assert_eq!(acc.current_stats(), SessionStats::default());

        let update = acc.record_scan(&result(Category::Pure, 80.0));
        assert_eq!(update.stats.total_scanned, 1);
    }

    #[test]
    fn test_record_at_counter_limit_does_not_panic() {
        let full = SessionStats {
            total_scanned: u64::MAX,
            pure_count: u64::MAX,
            blend_count: 0,
            running_purity_average: 50.0,
            ..SessionStats::default()
        };
        let acc = StatsAccumulator::restore(MemoryStore::with_snapshot(full));

        let update = acc.record_scan(&result(Category::Pure, 50.0));
        assert!(update.is_persisted());
        assert_eq!(update.stats.total_scanned, u64::MAX);
        assert_eq!(update.stats.pure_count, u64::MAX);
        assert_eq!(update.stats.last_result, Some(result(Category::Pure, 50.0)));
    }

    #[test]
    fn test_concurrent_records_lose_no_updates() {
        let acc = Arc::new(StatsAccumulator::new(MemoryStore::new()));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [Category::Pure, Category::Blend]
            .into_iter()
            .map(|category| {
                let acc = Arc::clone(&acc);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    acc.record_scan(&ClassificationResult::new(category, 50.0));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = acc.current_stats();
        assert_eq!(stats.total_scanned, 2);
        assert_eq!(stats.pure_count + stats.blend_count, 2);
        assert_eq!(acc.store().load().unwrap().unwrap().total_scanned, 2);
    }

    #[test]
    fn test_readers_never_see_torn_counts() {
        let acc = Arc::new(StatsAccumulator::new(MemoryStore::new()));

        let writer = {
            let acc = Arc::clone(&acc);
            thread::spawn(move || {
                for i in 0..500 {
                    let category = if i % 2 == 0 { Category::Pure } else { Category::Blend };
                    acc.record_scan(&ClassificationResult::new(category, 75.0));
                }
            })
        };

        for _ in 0..500 {
            let stats = acc.current_stats();
            assert_eq!(stats.pure_count + stats.blend_count, stats.total_scanned);
        }
        writer.join().unwrap();
        assert_eq!(acc.current_stats().total_scanned, 500);
    }
}
