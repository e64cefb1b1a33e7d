//! One-shot object detection augmentation and a style-transfer model wrapper.
//!
//! The augmentation half turns a single object image into many detection training examples:
//! a [`ParameterSampler`] draws a perspective placement, the object is resampled through the
//! inverse transform, its alpha edge is snapped to the warped outline, and the result is
//! composited over a background. [`augment`] runs this over a batch of backgrounds and labels
//! each result with a [`BoundingBox`].
//!
//! The style-transfer half ([`StyleTransfer`]) manages options, the training loop, inference,
//! export and persistence, delegating all tensor work to a [`ComputeContext`].
//!
//! ```no_run
//! use oneshot::{AugmentConfig, FlexImage, ImageFrame, augment};
//!
//! # fn main() -> oneshot::OneShotResult<()> {
//! let object = FlexImage::open("mug.png".as_ref())?;
//! let background = FlexImage::open("kitchen.jpg".as_ref())?.into_decoded()?;
//! let samples = augment(&[background], &object, "mug", &AugmentConfig::default())?;
//! samples[0].image.save_png("sample.png".as_ref())?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod augment;
mod foundation;
mod imaging;
mod style_transfer;

pub use augment::batch::{BoundingBox, SyntheticSample, augment};
pub use augment::composite::{composite, composite_into, over};
pub use augment::config::{AugmentConfig, SamplerConfig};
pub use augment::edge::repair_edges;
pub use augment::geometry::{QUAD_EPSILON, Quad, compute_warped_corners};
pub use augment::resample::{SAMPLE_EPSILON, resample, resample_into, sample_bilinear};
pub use augment::sampler::{FixedWarp, ParameterSampler, Warp, WarpParams};
pub use augment::synth::{create_synthetic_image, transform_and_superimpose};
pub use foundation::core::{
    Affine, Canvas, Homography, Point, RGB_WHITE, RGBA_WHITE, Rect, Rgb8, Rgba8, Vec2,
};
pub use foundation::error::{OneShotError, OneShotResult};
pub use imaging::flex::FlexImage;
pub use imaging::frame::ImageFrame;
pub use imaging::resize::resize_image;
pub use style_transfer::backend::{
    Batch, ComputeContext, DataIterator, ExportedModel, ImageIterator, IteratorParams,
    ModelExporter, TrainingBackend, WeightMap,
};
pub use style_transfer::model::{
    CustomModelData, STYLE_TRANSFER_VERSION, StyleTransfer, StylizedImage,
};
pub use style_transfer::options::{
    DEFAULT_BATCH_SIZE, DEFAULT_IMAGE_SIZE, ExportOptions, OptionMap, StyleTransferOptions,
    derived_max_iterations,
};
