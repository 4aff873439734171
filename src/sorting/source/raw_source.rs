//! RAW still images (ARW, DNG, NEF, ...) decoded with rawloader.
//!
//! Bayer sensor data is demosaiced with the `bayer` crate, then black level,
//! white level and camera white balance are applied and the result is gamma
//! encoded to 8 bits, roughly what a camera's own JPEG pipeline would hand us.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut, CFA};
use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::Frame;
use crate::sorting::source::reader::FrameSource;

const DISPLAY_GAMMA: f32 = 1.0 / 2.2;

pub struct RawStillSource {
    path: PathBuf,
    name: String,
}

impl RawStillSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("raw:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for RawStillSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Result<Frame> {
        let data = std::fs::read(&self.path)
            .map_err(|e| SortError::Capture(format!("{}: {}", self.path.display(), e)))?;
        decode_raw(&data)
    }
}

pub fn decode_raw(data: &[u8]) -> Result<Frame> {
    debug!("Decoding RAW image, {} bytes", data.len());

    let decoded = rawloader::decode(&mut Cursor::new(data))
        .map_err(|e| SortError::Capture(format!("RAW decode failed: {}", e)))?;
    let (width, height) = (decoded.width, decoded.height);

    let values: Vec<u16> = match decoded.data {
        RawloaderImageData::Integer(values) => values,
        RawloaderImageData::Float(values) => values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16)
            .collect(),
    };

    let rgb16 = match decoded.cpp {
        1 => {
            let (top_left, top_right) = (decoded.cfa.color_at(0, 0), decoded.cfa.color_at(0, 1));
            let cfa = cfa_from_colors(top_left, top_right).ok_or_else(|| {
                SortError::Capture(format!("unsupported CFA pattern ({top_left}, {top_right})"))
            })?;
            demosaic(&values, width, height, cfa)?
        }
        3 => values,
        cpp => return Err(SortError::Capture(format!("unsupported {cpp} components per pixel"))),
    };

    let levels = Levels::new(decoded.blacklevels[0], decoded.whitelevels[0], decoded.wb_coeffs);
    debug!(width, height, ?levels, "Normalising RAW samples");

    let data = rgb16
        .chunks_exact(3)
        .flat_map(|px| [levels.to_u8(0, px[0]), levels.to_u8(1, px[1]), levels.to_u8(2, px[2])])
        .collect();
    Frame::new(width, height, data)
}

/// Maps the colors of the top-left 2x1 sensor cells (0 = red, 1 = green,
/// 2 = blue) to a Bayer layout.
fn cfa_from_colors(top_left: usize, top_right: usize) -> Option<CFA> {
    match (top_left, top_right) {
        (0, 1) => Some(CFA::RGGB),
        (2, 1) => Some(CFA::BGGR),
        (1, 0) => Some(CFA::GRBG),
        (1, 2) => Some(CFA::GBRG),
        _ => None,
    }
}

fn demosaic(mosaic: &[u16], width: usize, height: usize, cfa: CFA) -> Result<Vec<u16>> {
    let input: Vec<u8> = mosaic.iter().flat_map(|&v| v.to_le_bytes()).collect();
    let mut output = vec![0u8; width * height * 3 * 2];

    {
        let mut raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output);
        bayer::run_demosaic(
            &mut Cursor::new(&input[..]),
            BayerDepth::Depth16LE,
            cfa,
            Demosaic::Linear,
            &mut raster,
        )
        .map_err(|e| SortError::Capture(format!("demosaic failed: {:?}", e)))?;
    }

    Ok(output
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect())
}

#[derive(Debug, Clone, Copy)]
struct Levels {
    black: f32,
    range: f32,
    white_balance: [f32; 3],
}

impl Levels {
    fn new(black: u16, white: u16, wb_coeffs: [f32; 4]) -> Self {
        let green = wb_coeffs[1];
        let ratio = |c: f32| {
            let r = c / green;
            if r.is_finite() && r > 0.0 { r } else { 1.0 }
        };
        let black = black as f32;
        let white = if white == 0 { u16::MAX as f32 } else { white as f32 };

        Self {
            black,
            range: (white - black).max(1.0),
            white_balance: [ratio(wb_coeffs[0]), 1.0, ratio(wb_coeffs[2])],
        }
    }

    fn to_u8(&self, channel: usize, value: u16) -> u8 {
        let linear = ((value as f32 - self.black).max(0.0) / self.range) * self.white_balance[channel];
        (linear.clamp(0.0, 1.0).powf(DISPLAY_GAMMA) * 255.0).round() as u8
    }
}
