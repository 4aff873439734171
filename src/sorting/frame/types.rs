//! Frame types

use crate::sorting::common::error::{Result, SortError};

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// An immutable color raster captured for a single scan.
///
/// Pixels are stored row-major and interleaved as `[R, G, B, R, G, B, ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps an interleaved RGB buffer.
    ///
    /// Fails with [`SortError::InvalidFrame`] when the buffer length does not
    /// match `width * height * 3`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(CHANNELS))
            .ok_or(SortError::InvalidDimensions(width, height))?;

        if data.len() != expected {
            return Err(SortError::InvalidFrame(format!(
                "buffer holds {} bytes, expected {} for {}x{} RGB",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self { width, height, data })
    }

    /// A frame where every pixel has the same color.
    #[cfg(test)]
    pub(crate) fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width * height * CHANNELS)
            .collect();
        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The interleaved bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * CHANNELS;
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * self.width + x) * CHANNELS;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_short_buffer() {
        let result = Frame::new(4, 4, vec![0u8; 10]);
        assert!(matches!(result, Err(SortError::InvalidFrame(_))));
    }

    #[test]
    fn test_filled_frame_layout() {
        let frame = Frame::filled(3, 2, [1, 2, 3]);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.pixel(2, 1), [1, 2, 3]);
        assert_eq!(frame.row(1), &[1, 2, 3, 1, 2, 3, 1, 2, 3]);
    }
}
