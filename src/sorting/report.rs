//! Dashboard summary of a session.
//!
//! Reporting surfaces (the terminal loop, the web dashboard) poll the
//! snapshot and show this summary rather than the raw counters.

use std::fmt;

use chrono::Local;
use serde::Serialize;

use crate::sorting::stats::SessionStats;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub total_scanned: u64,
    pub pure_count: u64,
    pub blend_count: u64,
    /// Share of scanned items classified Pure, one decimal.
    pub bale_purity: f64,
    /// Mean cotton purity score over the session, one decimal.
    pub average_purity: f64,
    pub last_composition: Option<String>,
    /// Local time, or `"Never"`.
    pub last_update: String,
}

impl From<&SessionStats> for SessionReport {
    fn from(stats: &SessionStats) -> Self {
        let bale_purity = if stats.is_empty() {
            0.0
        } else {
            stats.pure_count as f64 / stats.total_scanned as f64 * 100.0
        };

        let last_update = match stats.last_updated {
            Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "Never".to_string(),
        };

        Self {
            total_scanned: stats.total_scanned,
            pure_count: stats.pure_count,
            blend_count: stats.blend_count,
            bale_purity: round1(bale_purity),
            average_purity: round1(stats.running_purity_average),
            last_composition: stats
                .last_result
                .as_ref()
                .map(|r| r.composition_label.clone()),
            last_update,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "================ FiberTrace Dashboard ================")?;
        writeln!(f, " Total items scanned : {}", self.total_scanned)?;
        writeln!(f, " Pure (cotton)       : {}", self.pure_count)?;
        writeln!(f, " Blend (poly-blend)  : {}", self.blend_count)?;
        writeln!(f, " Bale purity         : {:.1}%", self.bale_purity)?;
        writeln!(f, " Average purity      : {:.1}%", self.average_purity)?;
        if let Some(label) = &self.last_composition {
            writeln!(f, " Last sample         : {}", label)?;
        }
        writeln!(f, " Last update         : {}", self.last_update)?;
        write!(f, "======================================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorting::classify::{Category, ClassificationResult};

    #[test]
    fn test_empty_session_report() {
        let report = SessionReport::from(&SessionStats::default());
        assert_eq!(report.bale_purity, 0.0);
        assert_eq!(report.last_update, "Never");
        assert!(report.last_composition.is_none());
    }

    #[test]
    fn test_bale_purity_is_share_of_pure_items() {
        let stats = SessionStats {
            total_scanned: 3,
            pure_count: 2,
            blend_count: 1,
            running_purity_average: 61.234,
            last_result: Some(ClassificationResult::new(Category::Pure, 97.1)),
            last_updated: Some(chrono::Utc::now()),
        };
        let report = SessionReport::from(&stats);

        assert_eq!(report.bale_purity, 66.7);
        assert_eq!(report.average_purity, 61.2);
        assert_eq!(report.last_composition.as_deref(), Some("97% Cotton, 3% Poly Blend"));
        assert_ne!(report.last_update, "Never");

        let text = report.to_string();
        assert!(text.contains("Bale purity         : 66.7%"));
        assert!(text.contains("Pure (cotton)       : 2"));
    }

    #[test]
    fn test_report_json_shape() {
        let value = serde_json::to_value(SessionReport::from(&SessionStats::default())).unwrap();
        assert_eq!(value["total_scanned"], 0);
        assert_eq!(value["bale_purity"], 0.0);
        assert_eq!(value["last_update"], "Never");
    }
}
