//! Inverse-mapped bilinear resampling of the object image.

use rayon::prelude::*;

use crate::foundation::core::{Canvas, Homography, Point, RGBA_WHITE, Rgba8};
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::foundation::math::round_clamp_u8;
use crate::imaging::frame::ImageFrame;

/// Slack around the sampling support so exact pixel centres survive float round-off.
pub const SAMPLE_EPSILON: f64 = 1e-6;

/// Resample `source` into a fresh RGBA buffer of size `destination`.
///
/// Destination pixel `(x, y)` is mapped through `inverse` into source space and bilinearly
/// interpolated. Pixels mapping outside `[0, w) x [0, h)` are [`RGBA_WHITE`] (transparent).
pub fn resample(
    source: &ImageFrame,
    destination: Canvas,
    inverse: &Homography,
) -> OneShotResult<ImageFrame> {
    let mut out = ImageFrame::filled_rgba(destination.width, destination.height, RGBA_WHITE)?;
    resample_into(source, &mut out, inverse)?;
    Ok(out)
}

/// Resample `source` into every pixel of the existing RGBA buffer `dst`.
pub fn resample_into(
    source: &ImageFrame,
    dst: &mut ImageFrame,
    inverse: &Homography,
) -> OneShotResult<()> {
    if source.channels() != 4 {
        return Err(OneShotError::internal(format!(
            "resampler source must be RGBA, got {} channels",
            source.channels()
        )));
    }
    if dst.channels() != 4 {
        return Err(OneShotError::internal(format!(
            "resampler destination must be RGBA, got {} channels",
            dst.channels()
        )));
    }

    let width = dst.width() as usize;
    let stride = dst.stride();
    dst.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let px = inverse
                    .project(Point::new(x as f64, y as f64))
                    .and_then(|p| sample_bilinear(source, p))
                    .unwrap_or(RGBA_WHITE);
                row[x * 4..x * 4 + 4].copy_from_slice(&px.to_array());
            }
        });
    Ok(())
}

/// Bilinear sample of an RGBA frame at `p`, or `None` outside the sampling support.
///
/// The support is the source area `[0, w) x [0, h)`, so every pixel of the warped object
/// rectangle is covered. Neighbour indices are clamped at the last row and column: points past
/// the last pixel centre reproduce the edge pixel.
pub fn sample_bilinear(src: &ImageFrame, p: Point) -> Option<Rgba8> {
    let (w, h) = (f64::from(src.width()), f64::from(src.height()));
    let in_x = p.x >= -SAMPLE_EPSILON && p.x < w - SAMPLE_EPSILON;
    let in_y = p.y >= -SAMPLE_EPSILON && p.y < h - SAMPLE_EPSILON;
    if !(in_x && in_y) {
        return None;
    }

    let x = p.x.clamp(0.0, w - 1.0);
    let y = p.y.clamp(0.0, h - 1.0);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let fx = x - f64::from(x0);
    let fy = y - f64::from(y0);

    let taps = [
        (src.rgba_at(x0, y0).to_array(), (1.0 - fx) * (1.0 - fy)),
        (src.rgba_at(x1, y0).to_array(), fx * (1.0 - fy)),
        (src.rgba_at(x0, y1).to_array(), (1.0 - fx) * fy),
        (src.rgba_at(x1, y1).to_array(), fx * fy),
    ];
    let mut out = [0u8; 4];
    for (c, v) in out.iter_mut().enumerate() {
        let sum: f64 = taps.iter().map(|(px, w)| f64::from(px[c]) * w).sum();
        *v = round_clamp_u8(sum);
    }
    Some(Rgba8::from_array(out))
}

#[cfg(test)]
#[path = "../../tests/unit/augment/resample.rs"]
mod tests;
