use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::flex::FlexImage;
use crate::imaging::frame::ImageFrame;
use crate::style_transfer::backend::{
    ComputeContext, DataIterator, ExportedModel, IteratorParams, ModelExporter, TrainingBackend,
    WeightMap,
};
use crate::style_transfer::options::{ExportOptions, OptionMap, StyleTransferOptions};

/// Version written by [`StyleTransfer::save`]. Older versions load; newer ones are rejected.
pub const STYLE_TRANSFER_VERSION: u32 = 1;

/// One output row of [`StyleTransfer::predict`].
#[derive(Clone, Debug, PartialEq)]
pub struct StylizedImage {
    /// Index of the input image.
    pub row_id: usize,
    /// Style the image was rendered in.
    pub style: usize,
    /// Rendered image.
    pub stylized_image: ImageFrame,
}

/// Weights and shape of a model trained outside this crate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CustomModelData {
    /// Trained parameters.
    pub weights: WeightMap,
    /// Number of styles the parameters encode.
    pub num_styles: usize,
    /// Optional option overrides, e.g. the input size the model was trained at.
    #[serde(default)]
    pub options: OptionMap,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SavedModel {
    version: u32,
    options: StyleTransferOptions,
    state: OptionMap,
    weights: WeightMap,
}

struct TrainingSession {
    iterator: Box<dyn DataIterator>,
    backend: Box<dyn TrainingBackend>,
    started: Instant,
}

/// Style-transfer model: options, training loop, inference, export and persistence.
///
/// Neural-network work is delegated to the [`ComputeContext`] the model is built with.
pub struct StyleTransfer {
    context: Box<dyn ComputeContext>,
    options: StyleTransferOptions,
    state: OptionMap,
    weights: Option<WeightMap>,
    training: Option<TrainingSession>,
}

impl std::fmt::Debug for StyleTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleTransfer")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("trained", &self.weights.is_some())
            .field("training", &self.training.is_some())
            .finish()
    }
}

impl StyleTransfer {
    /// An untrained model with default options.
    pub fn new(context: Box<dyn ComputeContext>) -> Self {
        Self {
            context,
            options: StyleTransferOptions::default(),
            state: OptionMap::new(),
            weights: None,
            training: None,
        }
    }

    /// Replace the options with `opts` over the defaults and mirror them into the state.
    pub fn init_options(&mut self, opts: &OptionMap) -> OneShotResult<()> {
        self.set_options(StyleTransferOptions::from_map(opts)?)
    }

    fn set_options(&mut self, options: StyleTransferOptions) -> OneShotResult<()> {
        self.state.extend(options.to_map()?);
        self.options = options;
        Ok(())
    }

    /// Current options.
    pub fn options(&self) -> &StyleTransferOptions {
        &self.options
    }

    /// Every state entry: options plus training results.
    pub fn get_state(&self) -> &OptionMap {
        &self.state
    }

    /// A single state entry.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Trained parameters, if any.
    pub fn weights(&self) -> Option<&WeightMap> {
        self.weights.as_ref()
    }

    /// Iterations completed in the current or last training run.
    pub fn training_iterations(&self) -> usize {
        self.state_usize("training_iterations")
    }

    fn state_usize(&self, key: &str) -> usize {
        self.state
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map_or(0, |v| v as usize)
    }

    /// Train from scratch: [`init_train`](Self::init_train), iterate to `max_iterations`,
    /// then [`finalize_training`](Self::finalize_training).
    #[tracing::instrument(skip_all, fields(styles = style.len(), content = content.len()))]
    pub fn train(
        &mut self,
        style: Vec<FlexImage>,
        content: Vec<FlexImage>,
        opts: &OptionMap,
    ) -> OneShotResult<()> {
        self.init_train(style, content, opts)?;
        while self.training_iterations() < self.options.max_iterations {
            self.iterate_training()?;
        }
        self.finalize_training()
    }

    /// Validate inputs, resolve derived options and build the iterator and backend.
    pub fn init_train(
        &mut self,
        style: Vec<FlexImage>,
        content: Vec<FlexImage>,
        opts: &OptionMap,
    ) -> OneShotResult<()> {
        if style.is_empty() {
            return Err(OneShotError::validation("style images must not be empty"));
        }
        if content.is_empty() {
            return Err(OneShotError::validation("content images must not be empty"));
        }

        let mut options = StyleTransferOptions::from_map(opts)?;
        options.infer_derived(style.len());
        options.validate(style.len())?;

        let iterator = self.context.create_iterator(IteratorParams {
            content,
            style,
            batch_size: options.batch_size,
            image_width: options.image_width,
            image_height: options.image_height,
            repeat: true,
            shuffle: true,
            random_seed: options.random_seed,
        })?;
        let backend = self.context.create_training_backend(&options, None)?;

        self.set_options(options)?;
        self.state
            .insert("training_iterations".to_owned(), serde_json::json!(0));
        self.state.remove("training_loss");
        self.weights = None;
        self.training = Some(TrainingSession {
            iterator,
            backend,
            started: Instant::now(),
        });
        tracing::info!(
            num_styles = self.options.num_styles,
            batch_size = self.options.batch_size,
            max_iterations = self.options.max_iterations,
            "style transfer training initialised"
        );
        Ok(())
    }

    /// Run one training step and return its loss.
    ///
    /// An iterator that runs dry is rewound and asked again.
    pub fn iterate_training(&mut self) -> OneShotResult<f32> {
        let iteration = self.training_iterations() + 1;
        let session = self
            .training
            .as_mut()
            .ok_or_else(|| OneShotError::validation("iterate_training called before init_train"))?;

        let batch = match session.iterator.next_batch()? {
            Some(batch) => batch,
            None => {
                session.iterator.reset();
                session.iterator.next_batch()?.ok_or_else(|| {
                    OneShotError::backend("data iterator produced no batch after reset")
                })?
            }
        };
        let loss = session.backend.train_step(&batch)?;
        let elapsed_s = session.started.elapsed().as_secs_f64();

        self.state
            .insert("training_iterations".to_owned(), serde_json::json!(iteration));
        self.state
            .insert("training_loss".to_owned(), serde_json::json!(loss));
        tracing::info!(iteration, loss, elapsed_s, "training progress");
        Ok(loss)
    }

    /// Capture the trained weights and release the training resources.
    pub fn finalize_training(&mut self) -> OneShotResult<()> {
        let session = self.training.take().ok_or_else(|| {
            OneShotError::validation("finalize_training called before init_train")
        })?;
        self.weights = Some(session.backend.weights()?);
        let training_time = session.started.elapsed().as_secs_f64();
        self.state
            .insert("training_time".to_owned(), serde_json::json!(training_time));
        tracing::info!(
            iterations = self.training_iterations(),
            training_time,
            "style transfer training finished"
        );
        Ok(())
    }

    /// Stylize every image in every requested style (all styles when `styles` is `None`).
    ///
    /// Rows are ordered by image, then by style.
    pub fn predict(
        &self,
        images: &[FlexImage],
        styles: Option<&[usize]>,
    ) -> OneShotResult<Vec<StylizedImage>> {
        let weights = self.trained_weights()?;
        let all: Vec<usize> = (0..self.options.num_styles).collect();
        let styles = styles.unwrap_or(all.as_slice());
        if let Some(bad) = styles.iter().find(|&&s| s >= self.options.num_styles) {
            return Err(OneShotError::validation(format!(
                "style index {bad} out of range for a model with {} styles",
                self.options.num_styles
            )));
        }

        let mut backend = self
            .context
            .create_training_backend(&self.options, Some(weights))?;
        let mut rows = Vec::with_capacity(images.len() * styles.len());
        for (row_id, image) in images.iter().enumerate() {
            let frame = image.decode()?;
            for &style in styles {
                rows.push(StylizedImage {
                    row_id,
                    style,
                    stylized_image: backend.predict(&frame, style)?,
                });
            }
        }
        Ok(rows)
    }

    /// Write the trained model through `exporter`.
    pub fn export(
        &self,
        exporter: &dyn ModelExporter,
        path: &Path,
        options: &ExportOptions,
    ) -> OneShotResult<ExportedModel> {
        let weights = self.trained_weights()?;
        let resolved = ExportOptions {
            image_width: Some(options.image_width.unwrap_or(self.options.image_width)),
            image_height: Some(options.image_height.unwrap_or(self.options.image_height)),
            ..options.clone()
        };
        let exported = exporter.export(weights, &resolved, path)?;
        tracing::info!(path = %exported.path.display(), "style transfer model exported");
        Ok(exported)
    }

    /// Adopt weights trained elsewhere.
    pub fn import_from_custom_model(
        &mut self,
        model: CustomModelData,
        version: u32,
    ) -> OneShotResult<()> {
        check_version(version)?;
        if model.weights.is_empty() {
            return Err(OneShotError::validation("custom model has no weights"));
        }
        if model.num_styles == 0 {
            return Err(OneShotError::validation("custom model must have at least one style"));
        }
        let mut options = StyleTransferOptions::from_map(&model.options)?;
        options.num_styles = model.num_styles;
        options.infer_derived(model.num_styles);
        self.set_options(options)?;
        self.weights = Some(model.weights);
        self.training = None;
        Ok(())
    }

    /// Serialize options, state and weights as a versioned JSON document.
    pub fn save<W: Write>(&self, writer: W) -> OneShotResult<()> {
        let saved = SavedModel {
            version: STYLE_TRANSFER_VERSION,
            options: self.options.clone(),
            state: self.state.clone(),
            weights: self.trained_weights()?.clone(),
        };
        serde_json::to_writer(writer, &saved)?;
        Ok(())
    }

    /// Restore a model written by [`save`](Self::save).
    pub fn load<R: Read>(context: Box<dyn ComputeContext>, reader: R) -> OneShotResult<Self> {
        let saved: SavedModel = serde_json::from_reader(reader)?;
        check_version(saved.version)?;
        Ok(Self {
            context,
            options: saved.options,
            state: saved.state,
            weights: Some(saved.weights),
            training: None,
        })
    }

    fn trained_weights(&self) -> OneShotResult<&WeightMap> {
        self.weights
            .as_ref()
            .ok_or_else(|| OneShotError::validation("model has not been trained"))
    }
}

fn check_version(version: u32) -> OneShotResult<()> {
    if version > STYLE_TRANSFER_VERSION {
        return Err(OneShotError::validation(format!(
            "model version {version} is newer than supported version {STYLE_TRANSFER_VERSION}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/style_transfer/model.rs"]
mod tests;
