use rayon::prelude::*;

use crate::augment::config::AugmentConfig;
use crate::augment::geometry::Quad;
use crate::augment::sampler::{ParameterSampler, Warp, WarpParams};
use crate::augment::synth::create_synthetic_image;
use crate::foundation::core::Canvas;
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::flex::FlexImage;
use crate::imaging::frame::ImageFrame;
use crate::imaging::resize::resize_image;

/// Detection label in centre/size form, in canvas pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Class label.
    pub label: String,
    /// Box centre x.
    pub x: f64,
    /// Box centre y.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

impl BoundingBox {
    /// Axis-aligned box around `quad`, clipped to `canvas`. `None` if nothing is visible.
    pub fn from_quad(label: &str, quad: &Quad, canvas: Canvas) -> Option<Self> {
        let r = quad.bounding_box().intersect(canvas.rect());
        if r.width() <= 0.0 || r.height() <= 0.0 {
            return None;
        }
        let c = r.center();
        Some(Self {
            label: label.to_owned(),
            x: c.x,
            y: c.y,
            width: r.width(),
            height: r.height(),
        })
    }
}

/// One augmented training example.
#[derive(Clone, Debug)]
pub struct SyntheticSample {
    /// Index into the backgrounds passed to [`augment`].
    pub background_index: usize,
    /// Sampler row used for this sample.
    pub row: u64,
    /// Placement that produced the image.
    pub params: WarpParams,
    /// Warped object outline.
    pub corners: Quad,
    /// Opaque RGB synthetic image.
    pub image: ImageFrame,
    /// Detection label for the pasted object.
    pub annotation: BoundingBox,
}

/// Paste `object` onto every background `samples_per_background` times.
///
/// Sample `i` (background `i / samples_per_background`) draws its placement from sampler row `i`,
/// so results only depend on the inputs and `config.seed`, not on thread scheduling.
#[tracing::instrument(skip_all, fields(backgrounds = backgrounds.len(), label = label))]
pub fn augment(
    backgrounds: &[ImageFrame],
    object: &FlexImage,
    label: &str,
    config: &AugmentConfig,
) -> OneShotResult<Vec<SyntheticSample>> {
    config.validate()?;
    let object = resize_image(object, object.width(), object.height(), 4, true)?;
    let per = config.samples_per_background as usize;
    let total = backgrounds
        .len()
        .checked_mul(per)
        .ok_or_else(|| OneShotError::validation("augmentation sample count overflow"))?;

    let samples = (0..total)
        .into_par_iter()
        .map(|i| {
            let background_index = i / per;
            let background = &backgrounds[background_index];
            let row = i as u64;
            let mut sampler =
                ParameterSampler::new(object.width(), object.height(), config.sampler.clone())?;
            let params = sampler.sample(background.canvas(), config.seed, row)?;
            let image = create_synthetic_image(background, &sampler, &object)?;
            let corners = sampler.warped_corners();
            let annotation = BoundingBox::from_quad(label, &corners, background.canvas())
                .ok_or_else(|| OneShotError::internal("sampled object is not visible on canvas"))?;
            Ok(SyntheticSample {
                background_index,
                row,
                params,
                corners,
                image,
                annotation,
            })
        })
        .collect::<OneShotResult<Vec<_>>>()?;

    tracing::debug!(samples = samples.len(), "augmentation finished");
    Ok(samples)
}

#[cfg(test)]
#[path = "../../tests/unit/augment/batch.rs"]
mod tests;
