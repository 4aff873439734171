use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::Frame;
use crate::sorting::source::convert::{rgb24_to_frame, yuyv_to_frame};
use crate::sorting::source::probe::CameraConfig;
use crate::sorting::source::reader::FrameSource;

/// Captures straight from a V4L2 device. Packed RGB is requested; drivers
/// that only offer YUYV are converted on the fly.
pub struct V4l2Source {
    config: CameraConfig,
    name: String,
}

impl V4l2Source {
    pub fn new(config: CameraConfig) -> Self {
        let name = format!("v4l2:{}", config.device_path);
        Self { config, name }
    }

    fn open_device(&self) -> Result<Device> {
        Device::with_path(&self.config.device_path).map_err(|e| self.capture_error(e))
    }

    fn configure_device(&self, device: &mut Device) -> Result<v4l::Format> {
        let mut format = device.format().map_err(|e| self.capture_error(e))?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = FourCC::new(b"RGB3");

        let format = device.set_format(&format).map_err(|e| self.capture_error(e))?;
        debug!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            stride = format.stride,
            "Negotiated capture format"
        );
        Ok(format)
    }

    fn capture_error(&self, err: std::io::Error) -> SortError {
        SortError::Capture(format!("{}: {}", self.config.device_path, err))
    }
}

impl FrameSource for V4l2Source {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Result<Frame> {
        let mut device = self.open_device()?;
        let format = self.configure_device(&mut device)?;

        let mut stream = MmapStream::new(&device, Type::VideoCapture).map_err(|e| self.capture_error(e))?;
        // Auto exposure needs a few frames to settle.
        for _ in 0..self.config.warmup_frames {
            stream.next().map_err(|e| self.capture_error(e))?;
        }
        let (buf, _meta) = stream.next().map_err(|e| self.capture_error(e))?;

        let (width, height, stride) = (
            format.width as usize,
            format.height as usize,
            format.stride as usize,
        );
        let frame = if format.fourcc == FourCC::new(b"RGB3") {
            rgb24_to_frame(buf, width, height, stride)?
        } else if format.fourcc == FourCC::new(b"YUYV") {
            yuyv_to_frame(buf, width, height, stride)?
        } else {
            return Err(SortError::Capture(format!(
                "{} only offers unsupported pixel format {}",
                self.config.device_path, format.fourcc
            )));
        };

        info!(width, height, "Captured frame from {}", self.config.device_path);
        Ok(frame)
    }
}
