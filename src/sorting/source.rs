//! Frame sources
//!
//! Live cameras are chosen at startup by probing (V4L2 first, then a
//! command-line capture tool); still images are opened by file type. The
//! engine only ever sees the resulting [`Frame`](crate::sorting::Frame).

mod command_source;
mod convert;
mod probe;
mod raw_source;
mod reader;
mod tiff_source;
#[cfg(target_os = "linux")]
mod v4l2_source;

pub use command_source::CommandCaptureSource;
pub use probe::{open_still, probe_camera, CameraConfig};
pub use raw_source::{decode_raw, RawStillSource};
pub use reader::FrameSource;
pub use tiff_source::{decode_tiff, TiffStillSource};
#[cfg(target_os = "linux")]
pub use v4l2_source::V4l2Source;
