//! Capture through an external command-line tool.
//!
//! The tool is asked to write a single TIFF frame to a temporary path, which
//! is then decoded like any still. `{output}` in the argument list is replaced
//! with that path.

use std::fs::File;
use std::io::BufReader;
use std::process::Command;

use tracing::{debug, error, info};

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::Frame;
use crate::sorting::source::reader::FrameSource;
use crate::sorting::source::tiff_source::decode_tiff;

const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone)]
pub struct CommandCaptureSource {
    program: String,
    args: Vec<String>,
    name: String,
}

impl Default for CommandCaptureSource {
    /// One 640x480 RGB frame from `/dev/video0` via ffmpeg.
    fn default() -> Self {
        Self::new(
            "ffmpeg",
            [
                "-loglevel", "error", "-y",
                "-f", "v4l2", "-video_size", "640x480", "-i", "/dev/video0",
                "-frames:v", "1", "-pix_fmt", "rgb24",
                OUTPUT_PLACEHOLDER,
            ],
        )
    }
}

impl CommandCaptureSource {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let name = format!("command:{program}");
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            name,
        }
    }

    /// Points the default ffmpeg invocation at another V4L2 device.
    pub fn with_device(mut self, device: &str) -> Self {
        for arg in self.args.iter_mut().filter(|a| a.as_str() == "/dev/video0") {
            *arg = device.to_string();
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the program can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl FrameSource for CommandCaptureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Result<Frame> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| SortError::Capture(format!("failed to create temp directory: {}", e)))?;
        let output_file = temp_dir.path().join("capture.tiff");
        let output_arg = output_file.to_string_lossy();

        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(arg.replace(OUTPUT_PLACEHOLDER, &output_arg));
        }

        info!("Capturing frame with {}", self.program);
        debug!("Command: {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| SortError::Capture(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() || !output_file.exists() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} failed:\nstderr: {}", self.program, stderr);
            return Err(SortError::Capture(format!(
                "{} produced no frame. Status: {}, stderr: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let file = File::open(&output_file)
            .map_err(|e| SortError::Capture(format!("{}: {}", output_file.display(), e)))?;
        decode_tiff(BufReader::new(file))
    }
}
