//! Synthetic image assembly: warp an object, repair its edges, composite it over a background.

use crate::augment::composite::composite_into;
use crate::augment::edge::repair_edges;
use crate::augment::resample::resample_into;
use crate::augment::sampler::Warp;
use crate::foundation::core::{RGB_WHITE, RGBA_WHITE};
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::flex::FlexImage;
use crate::imaging::frame::ImageFrame;
use crate::imaging::resize::resize_image;

/// Paste `object` onto `background` under `warp` and return the opaque RGB result.
///
/// The object is normalized to RGBA (its own size is kept), resampled through
/// `warp.inverse()` into a transparent canvas-sized buffer, edge-repaired along
/// `warp.warped_corners()`, and composited over the background with "over" blending.
#[tracing::instrument(
    skip_all,
    fields(width = background.width(), height = background.height())
)]
pub fn create_synthetic_image<W: Warp + ?Sized>(
    background: &ImageFrame,
    warp: &W,
    object: &FlexImage,
) -> OneShotResult<ImageFrame> {
    let (width, height) = (background.width(), background.height());
    let background_rgba = background.to_opaque_rgba();
    let mut transformed = ImageFrame::filled_rgba(width, height, RGBA_WHITE)?;
    let mut superimposed = ImageFrame::filled_rgb(width, height, RGB_WHITE)?;
    transform_and_superimpose(
        warp,
        object,
        &mut superimposed,
        &mut transformed,
        &background_rgba,
    )?;
    Ok(superimposed)
}

/// Run resample, edge repair and compositing into caller-provided buffers.
///
/// `transformed` must be RGBA and `superimposed` RGB, both sized like `background`.
pub fn transform_and_superimpose<W: Warp + ?Sized>(
    warp: &W,
    object: &FlexImage,
    superimposed: &mut ImageFrame,
    transformed: &mut ImageFrame,
    background: &ImageFrame,
) -> OneShotResult<()> {
    let object = resize_image(object, object.width(), object.height(), 4, true)?;
    let Some(starter) = object.as_frame() else {
        return Err(OneShotError::internal(
            "object image must be decoded before resampling",
        ));
    };
    if starter.channels() != 4 {
        return Err(OneShotError::internal(format!(
            "object image must have 4 channels before resampling, got {}",
            starter.channels()
        )));
    }

    resample_into(starter, transformed, &warp.inverse())?;
    repair_edges(transformed, &warp.warped_corners())?;
    composite_into(superimposed, transformed, background)
}

#[cfg(test)]
#[path = "../../tests/unit/augment/synth.rs"]
mod tests;
