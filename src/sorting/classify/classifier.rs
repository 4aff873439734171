use tracing::debug;

use crate::sorting::classify::types::{Category, ChannelAverages, ClassificationResult};
use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::Region;

/// Blue must exceed red + green by more than this many intensity units for a
/// sample to count as a blend.
pub const DEFAULT_BLUE_THRESHOLD: f64 = 20.0;

/// Stateless classifier; one instance can serve any number of scans.
#[derive(Debug, Clone, Copy)]
pub struct PurityClassifier {
    blue_threshold: f64,
}

impl Default for PurityClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BLUE_THRESHOLD)
    }
}

impl PurityClassifier {
    pub fn new(blue_threshold: f64) -> Self {
        Self { blue_threshold }
    }

    /// Arithmetic mean of each channel over every pixel in the region.
    pub fn channel_averages(&self, region: &Region<'_>) -> Result<ChannelAverages> {
        let count = region.pixel_count();
        if count == 0 {
            return Err(SortError::InvalidFrame("region contains no pixels".to_string()));
        }

        let mut sums = [0u64; 3];
        for px in region.pixels() {
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
        }

        let n = count as f64;
        Ok(ChannelAverages::new(
            sums[0] as f64 / n,
            sums[1] as f64 / n,
            sums[2] as f64 / n,
        ))
    }

    /// Applies the purity formula and the blue-dominance rule.
    ///
    /// The score and the category are computed independently: a uniformly gray
    /// sample scores ~67% yet is still Pure, because only the blue-excess rule
    /// decides the category.
    pub fn classify(&self, averages: &ChannelAverages) -> ClassificationResult {
        let sum = averages.sum();
        if sum <= 0.0 {
            // Nothing under the sensor (black frame).
            return ClassificationResult::new(Category::Blend, 0.0);
        }

        let red_ratio = averages.red / sum;
        let green_ratio = averages.green / sum;
        let purity = ((red_ratio + green_ratio) * 100.0).clamp(0.0, 100.0);

        let category = if averages.blue_excess() > self.blue_threshold {
            Category::Blend
        } else {
            Category::Pure
        };

        ClassificationResult::new(category, purity)
    }

    pub fn classify_region(&self, region: &Region<'_>) -> Result<ClassificationResult> {
        let averages = self.channel_averages(region)?;
        debug!(
            red = averages.red,
            green = averages.green,
            blue = averages.blue,
            "Region channel means"
        );
        Ok(self.classify(&averages))
    }
}
