//! Statistics types and their snapshot encoding

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sorting::classify::ClassificationResult;
use crate::sorting::common::error::{Result, SortError};

/// Running totals for one sorting session.
///
/// Unknown fields are ignored and missing fields fall back to zero/empty, so
/// older and newer snapshots both load. Legacy `good_count`,
/// `bad_count` and epoch-seconds `last_update` fields are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStats {
    pub total_scanned: u64,
    #[serde(alias = "good_count")]
    pub pure_count: u64,
    #[serde(alias = "bad_count")]
    pub blend_count: u64,
    /// Mean purity percent over every scan in the session.
    pub running_purity_average: f64,
    pub last_result: Option<ClassificationResult>,
    #[serde(alias = "last_update", deserialize_with = "timestamp::deserialize")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn is_empty(&self) -> bool {
        self.total_scanned == 0
    }

    /// Repairs counters that disagree after loading a foreign snapshot.
    /// Fails when the counters cannot describe a real session.
    pub(crate) fn normalize(&mut self) -> Result<()> {
        let counted = self
            .pure_count
            .checked_add(self.blend_count)
            .ok_or_else(|| {
                SortError::Persistence(format!(
                    "snapshot counters overflow: pure={} blend={}",
                    self.pure_count, self.blend_count
                ))
            })?;
        if counted != self.total_scanned {
            warn!(
                total = self.total_scanned,
                pure = self.pure_count,
                blend = self.blend_count,
                "Snapshot counters disagree, using pure + blend as total"
            );
            self.total_scanned = counted;
        }
        if !self.running_purity_average.is_finite() {
            self.running_purity_average = 0.0;
        }
        self.running_purity_average = self.running_purity_average.clamp(0.0, 100.0);
        Ok(())
    }
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Rfc3339(DateTime<Utc>),
        EpochSeconds(f64),
    }

    /// Accepts RFC 3339 strings or epoch seconds, where `0` means never.
    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<RawTimestamp>::deserialize(deserializer)? {
            Some(RawTimestamp::Rfc3339(at)) => Some(at),
            Some(RawTimestamp::EpochSeconds(secs)) if secs > 0.0 => {
                DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorting::classify::Category;

    #[test]
    fn test_snapshot_field_names() {
        let stats = SessionStats {
            total_scanned: 3,
            pure_count: 2,
            blend_count: 1,
            running_purity_average: 60.5,
            last_result: Some(ClassificationResult::new(Category::Blend, 45.45)),
            last_updated: DateTime::from_timestamp(1_700_000_000, 0),
        };
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["total_scanned"], 3);
        assert_eq!(value["pure_count"], 2);
        assert_eq!(value["blend_count"], 1);
        assert_eq!(value["last_result"]["category"], "blend");
        assert_eq!(value["last_result"]["composition_label"], "45% Cotton, 55% Poly Blend");
        assert_eq!(value["last_updated"], "2023-11-14T22:13:20Z");

        let back: SessionStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let stats: SessionStats =
            serde_json::from_str(r#"{"total_scanned": 4, "pure_count": 4, "operator": "night shift"}"#)
                .unwrap();
        assert_eq!(stats.total_scanned, 4);
        assert_eq!(stats.blend_count, 0);
        assert_eq!(stats.running_purity_average, 0.0);
        assert!(stats.last_result.is_none());
        assert!(stats.last_updated.is_none());
    }

    #[test]
    fn test_legacy_snapshot_loads() {
        let stats: SessionStats = serde_json::from_str(
            r#"{"total_scanned": 5, "good_count": 3, "bad_count": 2, "last_update": 1700000000.25}"#,
        )
        .unwrap();
        assert_eq!(stats.pure_count, 3);
        assert_eq!(stats.blend_count, 2);
        assert_eq!(stats.last_updated.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_zero_epoch_means_never() {
        let stats: SessionStats = serde_json::from_str(r#"{"last_update": 0}"#).unwrap();
        assert!(stats.last_updated.is_none());
    }

    #[test]
    fn test_normalize_repairs_total() {
        let mut stats = SessionStats {
            total_scanned: 10,
            pure_count: 3,
            blend_count: 2,
            running_purity_average: 140.0,
            ..SessionStats::default()
        };
        stats.normalize().unwrap();
        assert_eq!(stats.total_scanned, 5);
        assert_eq!(stats.running_purity_average, 100.0);
    }

    #[test]
    fn test_normalize_rejects_overflowing_counters() {
        let mut stats = SessionStats {
            pure_count: u64::MAX,
            blend_count: 1,
            ..SessionStats::default()
        };
        assert!(stats.normalize().unwrap_err().is_persistence());
    }
}
