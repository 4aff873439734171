//! Frame and region handling
//!
//! Frames are produced by an image source once per scan; the region selector
//! carves out the sub-view the classifier looks at.

mod region;
pub mod types;

pub use region::{Region, select_region, MIN_FRAME_DIMENSION};
pub(crate) use region::select_region_with_min;
pub use types::{Frame, CHANNELS};
