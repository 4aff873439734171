//! Pixel format conversions for camera buffers.

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::frame::{Frame, CHANNELS};

/// Copies packed 24-bit RGB rows, dropping any per-row padding.
pub(crate) fn rgb24_to_frame(buf: &[u8], width: usize, height: usize, stride: usize) -> Result<Frame> {
    let row_bytes = width * CHANNELS;
    let stride = stride.max(row_bytes);
    check_len(buf, stride, height, row_bytes)?;

    let mut data = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let start = y * stride;
        data.extend_from_slice(&buf[start..start + row_bytes]);
    }
    Frame::new(width, height, data)
}

/// Converts YUYV 4:2:2 (BT.601, limited range) to RGB.
pub(crate) fn yuyv_to_frame(buf: &[u8], width: usize, height: usize, stride: usize) -> Result<Frame> {
    if width % 2 != 0 {
        return Err(SortError::Capture(format!("YUYV frame width {width} is odd")));
    }
    let row_bytes = width * 2;
    let stride = stride.max(row_bytes);
    check_len(buf, stride, height, row_bytes)?;

    let mut data = Vec::with_capacity(width * height * CHANNELS);
    for y in 0..height {
        let row = &buf[y * stride..y * stride + row_bytes];
        for quad in row.chunks_exact(4) {
            let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
            data.extend_from_slice(&yuv_to_rgb(y0, u, v));
            data.extend_from_slice(&yuv_to_rgb(y1, u, v));
        }
    }
    Frame::new(width, height, data)
}

fn check_len(buf: &[u8], stride: usize, height: usize, row_bytes: usize) -> Result<()> {
    let needed = if height == 0 { 0 } else { stride * (height - 1) + row_bytes };
    if buf.len() < needed {
        return Err(SortError::Capture(format!(
            "camera buffer holds {} bytes, expected at least {}",
            buf.len(),
            needed
        )));
    }
    Ok(())
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = (y as f32 - 16.0) * 1.164;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;
    [
        (c + 1.596 * e).round().clamp(0.0, 255.0) as u8,
        (c - 0.392 * d - 0.813 * e).round().clamp(0.0, 255.0) as u8,
        (c + 2.017 * d).round().clamp(0.0, 255.0) as u8,
    ]
}
