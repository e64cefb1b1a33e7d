//! Narrow interfaces to the neural-network runtime and the model exporter.
//!
//! The wrapper never touches tensors directly: it asks a [`ComputeContext`] for a data iterator
//! and a training backend, feeds batches through them, and hands the resulting weights to a
//! [`ModelExporter`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::flex::FlexImage;
use crate::imaging::frame::ImageFrame;
use crate::imaging::resize::resize_image;
use crate::style_transfer::options::{ExportOptions, StyleTransferOptions};

/// Named parameter arrays of a trained model.
pub type WeightMap = BTreeMap<String, Vec<f32>>;

/// One training batch: content images paired with the style each should be rendered in.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    /// Content images at model input size.
    pub content: Vec<ImageFrame>,
    /// Style image for each content image.
    pub style: Vec<ImageFrame>,
    /// Style index for each content image.
    pub style_index: Vec<usize>,
}

impl Batch {
    /// Number of examples in the batch.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// `true` when the batch holds no examples.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Everything needed to build a [`DataIterator`].
#[derive(Clone, Debug)]
pub struct IteratorParams {
    /// Content images, any size.
    pub content: Vec<FlexImage>,
    /// One image per style, any size.
    pub style: Vec<FlexImage>,
    /// Examples per batch.
    pub batch_size: usize,
    /// Model input width.
    pub image_width: u32,
    /// Model input height.
    pub image_height: u32,
    /// Start a new epoch instead of ending when the content is exhausted.
    pub repeat: bool,
    /// Shuffle content order every epoch.
    pub shuffle: bool,
    /// Seed for shuffling and style selection.
    pub random_seed: u64,
}

/// Produces training batches.
pub trait DataIterator {
    /// Next batch, or `None` once a non-repeating iterator is exhausted.
    fn next_batch(&mut self) -> OneShotResult<Option<Batch>>;
    /// Rewind to the first batch of the first epoch.
    fn reset(&mut self);
}

/// A model being trained or used for inference.
pub trait TrainingBackend {
    /// Run one optimisation step and return the batch loss.
    fn train_step(&mut self, batch: &Batch) -> OneShotResult<f32>;
    /// Stylize `image` with style `style`.
    fn predict(&mut self, image: &ImageFrame, style: usize) -> OneShotResult<ImageFrame>;
    /// Current parameters.
    fn weights(&self) -> OneShotResult<WeightMap>;
    /// Replace the parameters.
    fn load_weights(&mut self, weights: &WeightMap) -> OneShotResult<()>;
}

/// Factory for iterators and backends on a particular device.
pub trait ComputeContext {
    /// Build a data iterator. The default keeps every image in memory.
    fn create_iterator(&self, params: IteratorParams) -> OneShotResult<Box<dyn DataIterator>> {
        Ok(Box::new(ImageIterator::new(params)?))
    }

    /// Build a backend, initialised from `weights` when given.
    fn create_training_backend(
        &self,
        options: &StyleTransferOptions,
        weights: Option<&WeightMap>,
    ) -> OneShotResult<Box<dyn TrainingBackend>>;
}

/// Description of an exported model file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportedModel {
    /// Written file.
    pub path: PathBuf,
    /// Exported input width.
    pub image_width: u32,
    /// Exported input height.
    pub image_height: u32,
    /// Free-form metadata recorded in the model.
    pub metadata: BTreeMap<String, String>,
}

/// Writes trained weights in a deployment format.
pub trait ModelExporter {
    /// Export `weights` to `path`.
    fn export(
        &self,
        weights: &WeightMap,
        options: &ExportOptions,
        path: &Path,
    ) -> OneShotResult<ExportedModel>;
}

/// In-memory [`DataIterator`] over pre-resized RGB images.
///
/// Each content image is paired with a style drawn uniformly from the style set. Batches are
/// deterministic in `random_seed`.
#[derive(Debug)]
pub struct ImageIterator {
    content: Vec<ImageFrame>,
    style: Vec<ImageFrame>,
    batch_size: usize,
    repeat: bool,
    shuffle: bool,
    seed: u64,
    rng: StdRng,
    order: Vec<usize>,
    cursor: usize,
}

impl ImageIterator {
    /// Decode and resize every image to the model input size.
    pub fn new(params: IteratorParams) -> OneShotResult<Self> {
        if params.content.is_empty() || params.style.is_empty() {
            return Err(OneShotError::validation(
                "data iterator needs at least one content and one style image",
            ));
        }
        if params.batch_size == 0 {
            return Err(OneShotError::validation("batch_size must be positive"));
        }
        let prepare = |images: &[FlexImage]| -> OneShotResult<Vec<ImageFrame>> {
            images
                .iter()
                .map(|img| {
                    let resized =
                        resize_image(img, params.image_width, params.image_height, 3, true)?;
                    resized.into_decoded()
                })
                .collect()
        };
        let content = prepare(&params.content)?;
        let style = prepare(&params.style)?;

        let mut it = Self {
            order: (0..content.len()).collect(),
            content,
            style,
            batch_size: params.batch_size,
            repeat: params.repeat,
            shuffle: params.shuffle,
            seed: params.random_seed,
            rng: StdRng::seed_from_u64(params.random_seed),
            cursor: 0,
        };
        it.start_epoch();
        Ok(it)
    }

    fn start_epoch(&mut self) {
        self.cursor = 0;
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }
}

impl DataIterator for ImageIterator {
    fn next_batch(&mut self) -> OneShotResult<Option<Batch>> {
        let mut batch = Batch::default();
        while batch.len() < self.batch_size {
            if self.cursor == self.order.len() {
                if !self.repeat {
                    break;
                }
                self.start_epoch();
            }
            let idx = self.order[self.cursor];
            self.cursor += 1;
            let style_index = self.rng.random_range(0..self.style.len());
            batch.content.push(self.content[idx].clone());
            batch.style.push(self.style[style_index].clone());
            batch.style_index.push(style_index);
        }
        Ok((!batch.is_empty()).then_some(batch))
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.order = (0..self.content.len()).collect();
        self.start_epoch();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style_transfer/backend.rs"]
mod tests;
