//! Startup selection of a frame source.

use std::path::Path;

use tracing::{info, warn};

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::source::command_source::CommandCaptureSource;
use crate::sorting::source::raw_source::RawStillSource;
use crate::sorting::source::reader::FrameSource;
use crate::sorting::source::tiff_source::TiffStillSource;

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub device_path: String,
    pub width: u32,
    pub height: u32,
    /// Frames discarded before the one that is kept.
    pub warmup_frames: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_path: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            warmup_frames: 3,
        }
    }
}

/// Returns the first camera path that delivers a test frame: the V4L2 device
/// directly (Linux), then the command-line capture tool.
pub fn probe_camera(camera: &CameraConfig, fallback: CommandCaptureSource) -> Result<Box<dyn FrameSource>> {
    let mut candidates: Vec<Box<dyn FrameSource>> = Vec::new();

    #[cfg(target_os = "linux")]
    candidates.push(Box::new(crate::sorting::source::V4l2Source::new(camera.clone())));
    #[cfg(not(target_os = "linux"))]
    let _ = camera;

    if fallback.is_available() {
        candidates.push(Box::new(fallback));
    } else {
        warn!("Capture tool {} not found, skipping", fallback.program());
    }

    select_first_working(candidates)
}

fn select_first_working(candidates: Vec<Box<dyn FrameSource>>) -> Result<Box<dyn FrameSource>> {
    let mut failures = Vec::new();

    for mut source in candidates {
        match source.capture() {
            Ok(frame) => {
                info!(
                    source = source.name(),
                    width = frame.width(),
                    height = frame.height(),
                    "Camera ready"
                );
                return Ok(source);
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Camera source unusable");
                failures.push(format!("{}: {}", source.name(), e));
            }
        }
    }

    if failures.is_empty() {
        failures.push("no capture method available".to_string());
    }
    Err(SortError::Capture(format!(
        "could not open a camera ({})",
        failures.join("; ")
    )))
}

/// Opens a still image by extension: TIFF directly, anything else as RAW.
pub fn open_still(path: &Path) -> Box<dyn FrameSource> {
    let is_tiff = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"));

    if is_tiff {
        Box::new(TiffStillSource::new(path))
    } else {
        Box::new(RawStillSource::new(path))
    }
}
