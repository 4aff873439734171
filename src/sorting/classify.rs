//! Purity classification
//!
//! Turns the selected region of a frame into per-channel means, a cosmetic
//! cotton-purity score, and the operational Pure/Blend category.

mod classifier;
pub mod types;


pub use classifier::{PurityClassifier, DEFAULT_BLUE_THRESHOLD};
pub use types::{Category, ChannelAverages, ClassificationResult};
