use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::types::{Frame, CHANNELS};

/// Frames narrower or shorter than this cannot yield a usable center region.
pub const MIN_FRAME_DIMENSION: usize = 4;

/// The centered half-width, half-height window of a frame (25% of its area).
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    frame: &'a Frame,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

/// Selects the region bounded by `[W/4, 3W/4) x [H/4, 3H/4)`.
pub fn select_region(frame: &Frame) -> Result<Region<'_>> {
    select_region_with_min(frame, MIN_FRAME_DIMENSION)
}

pub(crate) fn select_region_with_min(frame: &Frame, min_dimension: usize) -> Result<Region<'_>> {
    let (width, height) = (frame.width(), frame.height());
    if width < min_dimension || height < min_dimension {
        return Err(SortError::InvalidDimensions(width, height));
    }

    Ok(Region {
        frame,
        x0: width / 4,
        y0: height / 4,
        x1: width * 3 / 4,
        y1: height * 3 / 4,
    })
}

impl<'a> Region<'a> {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// `(x0, y0, x1, y1)`, half-open on the far edges.
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + 'a {
        let (x0, x1) = (self.x0, self.x1);
        let frame = self.frame;
        (self.y0..self.y1).flat_map(move |y| {
            frame.row(y)[x0 * CHANNELS..x1 * CHANNELS]
                .chunks_exact(CHANNELS)
                .map(|px| [px[0], px[1], px[2]])
        })
    }
}
