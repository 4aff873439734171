use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::Frame;
use crate::sorting::source::reader::FrameSource;

/// Reads a TIFF still from disk on every capture, so the file can be swapped
/// between scans.
pub struct TiffStillSource {
    path: PathBuf,
    name: String,
}

impl TiffStillSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("tiff:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for TiffStillSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Result<Frame> {
        let file = File::open(&self.path)
            .map_err(|e| SortError::Capture(format!("{}: {}", self.path.display(), e)))?;
        decode_tiff(BufReader::new(file))
    }
}

/// Decodes an 8- or 16-bit gray, RGB or RGBA TIFF into an 8-bit RGB frame.
pub fn decode_tiff<R: Read + Seek>(reader: R) -> Result<Frame> {
    let mut decoder = Decoder::new(reader).map_err(tiff_error)?;
    let (width, height) = decoder.dimensions().map_err(tiff_error)?;
    let color_type = decoder.colortype().map_err(tiff_error)?;

    let channels = match color_type {
        ColorType::Gray(8 | 16) => 1,
        ColorType::RGB(8 | 16) => 3,
        ColorType::RGBA(8 | 16) => 4,
        other => {
            return Err(SortError::Capture(format!("unsupported TIFF color type {:?}", other)));
        }
    };

    let samples: Vec<u8> = match decoder.read_image().map_err(tiff_error)? {
        DecodingResult::U8(buf) => buf,
        DecodingResult::U16(buf) => buf.iter().map(|&v| (v >> 8) as u8).collect(),
        _ => return Err(SortError::Capture("unsupported TIFF sample format".to_string())),
    };

    debug!(width, height, ?color_type, "Decoded TIFF");

    let data = match channels {
        1 => samples.iter().flat_map(|&v| [v, v, v]).collect(),
        3 => samples,
        _ => samples
            .chunks_exact(channels)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    };
    Frame::new(width as usize, height as usize, data)
}

fn tiff_error(err: tiff::TiffError) -> SortError {
    SortError::Capture(format!("TIFF decode failed: {}", err))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use tiff::encoder::{colortype, TiffEncoder};

    use super::*;

    pub(crate) fn encode_rgb8(width: u32, height: u32, data: &[u8]) -> Vec<u8> {
        let mut buffer = Vec::new();
        TiffEncoder::new(Cursor::new(&mut buffer))
            .unwrap()
            .write_image::<colortype::RGB8>(width, height, data)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_rgb8() {
        let pixels: Vec<u8> = (0..4 * 4 * 3).map(|i| i as u8).collect();
        let frame = decode_tiff(Cursor::new(encode_rgb8(4, 4, &pixels))).unwrap();

        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.data(), &pixels[..]);
    }

    #[test]
    fn test_decode_gray16_expands_to_rgb() {
        let mut buffer = Vec::new();
        TiffEncoder::new(Cursor::new(&mut buffer))
            .unwrap()
            .write_image::<colortype::Gray16>(2, 2, &[0x1234, 0xFF00, 0, 0xFFFF])
            .unwrap();

        let frame = decode_tiff(Cursor::new(buffer)).unwrap();
        assert_eq!(frame.pixel(0, 0), [0x12, 0x12, 0x12]);
        assert_eq!(frame.pixel(1, 1), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_still_source_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tiff");
        let mut source = TiffStillSource::new(&path);

        std::fs::write(&path, encode_rgb8(4, 4, &[255; 48])).unwrap();
        assert_eq!(source.capture().unwrap().pixel(0, 0), [255, 255, 255]);

        std::fs::write(&path, encode_rgb8(4, 4, &[0; 48])).unwrap();
        assert_eq!(source.capture().unwrap().pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_garbage_is_capture_error() {
        let result = decode_tiff(Cursor::new(b"not a tiff".to_vec()));
        assert!(matches!(result, Err(SortError::Capture(_))));
    }

    #[test]
    fn test_missing_file_is_capture_error() {
        let mut source = TiffStillSource::new("/nonexistent/sample.tiff");
        assert!(matches!(source.capture(), Err(SortError::Capture(_))));
    }
}
