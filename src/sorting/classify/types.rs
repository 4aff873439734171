//! Classification types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean intensity of each channel over a region, each in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelAverages {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ChannelAverages {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    pub fn sum(&self) -> f64 {
        self.red + self.green + self.blue
    }

    /// How far blue exceeds red and green combined.
    pub fn blue_excess(&self) -> f64 {
        self.blue - (self.red + self.green)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pure,
    Blend,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Pure => write!(f, "PURE (cotton)"),
            Category::Blend => write!(f, "BLEND (poly-blend / contamination)"),
        }
    }
}

/// Outcome of classifying one frame. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// Cotton purity score in `[0, 100]`.
    pub purity_percent: f64,
    /// e.g. `"95% Cotton, 5% Poly Blend"`; the two figures always sum to 100.
    pub composition_label: String,
}

impl ClassificationResult {
    pub fn new(category: Category, purity_percent: f64) -> Self {
        let purity_percent = purity_percent.clamp(0.0, 100.0);
        Self {
            category,
            purity_percent,
            composition_label: composition_label(purity_percent),
        }
    }

    pub fn is_pure(&self) -> bool {
        self.category == Category::Pure
    }
}

/// Rounds the cotton share once and derives the blend share from it.
pub(crate) fn composition_label(purity_percent: f64) -> String {
    let cotton = purity_percent.clamp(0.0, 100.0).round() as u32;
    format!("{}% Cotton, {}% Poly Blend", cotton, 100 - cotton)
}
