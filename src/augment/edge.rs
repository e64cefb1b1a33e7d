//! Alpha snapping along the warped object outline.

use crate::augment::geometry::Quad;
use crate::foundation::core::Point;
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::frame::ImageFrame;

/// Snap alpha to 0 or 255 around the warped object so bilinear halos cannot leak.
///
/// Only pixels inside the quad's bounding box are visited. A visited pixel the resampler reached
/// (alpha > 0) becomes opaque when its centre lies in `quad` and transparent otherwise. Pixels
/// that are already transparent are left alone, so no colour is invented for them.
pub fn repair_edges(transformed: &mut ImageFrame, quad: &Quad) -> OneShotResult<()> {
    if transformed.channels() != 4 {
        return Err(OneShotError::internal(format!(
            "edge repair expects an RGBA buffer, got {} channels",
            transformed.channels()
        )));
    }
    let Some((x_range, y_range)) = pixel_span(transformed, quad) else {
        return Ok(());
    };

    for y in y_range {
        for x in x_range.clone() {
            let a = transformed.rgba_at(x, y).a;
            if a == 0 {
                continue;
            }
            let inside = quad.contains(Point::new(f64::from(x), f64::from(y)));
            let repaired = if inside { 255 } else { 0 };
            if repaired != a {
                transformed.set_alpha(x, y, repaired);
            }
        }
    }
    Ok(())
}

/// Integer pixel ranges covered by the quad's bounding box, clamped to the frame.
fn pixel_span(
    frame: &ImageFrame,
    quad: &Quad,
) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
    if !quad.is_finite() {
        return None;
    }
    let bb = quad.bounding_box();
    let clamp = |v: f64, hi: u32| v.clamp(0.0, f64::from(hi)) as u32;
    let x0 = clamp(bb.x0.ceil(), frame.width());
    let y0 = clamp(bb.y0.ceil(), frame.height());
    let x1 = clamp(bb.x1.floor() + 1.0, frame.width());
    let y1 = clamp(bb.y1.floor() + 1.0, frame.height());
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0..x1, y0..y1))
}

#[cfg(test)]
#[path = "../../tests/unit/augment/edge.rs"]
mod tests;
