use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::foundation::error::{OneShotError, OneShotResult};

/// Batch size used when the caller leaves `batch_size` at 0.
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Default model input edge length in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

/// Key-value option map as accepted by [`StyleTransfer::init_options`](crate::StyleTransfer::init_options).
pub type OptionMap = BTreeMap<String, serde_json::Value>;

/// User-facing training options.
///
/// Zero values for `num_styles`, `batch_size` and `max_iterations` mean "infer"; see
/// [`StyleTransferOptions::infer_derived`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleTransferOptions {
    /// Number of styles the model learns. 0 takes the number of style images.
    pub num_styles: usize,
    /// Images per training iteration.
    pub batch_size: usize,
    /// Training iterations.
    pub max_iterations: usize,
    /// Model input width.
    pub image_width: u32,
    /// Model input height.
    pub image_height: u32,
    /// Pre-trained transformer network parameters.
    pub resnet_mlmodel_path: Option<PathBuf>,
    /// Pre-trained loss network parameters.
    pub vgg_mlmodel_path: Option<PathBuf>,
    /// Seed for batch shuffling and style selection.
    pub random_seed: u64,
}

impl Default for StyleTransferOptions {
    fn default() -> Self {
        Self {
            num_styles: 0,
            batch_size: 0,
            max_iterations: 0,
            image_width: DEFAULT_IMAGE_SIZE,
            image_height: DEFAULT_IMAGE_SIZE,
            resnet_mlmodel_path: None,
            vgg_mlmodel_path: None,
            random_seed: 0,
        }
    }
}

impl StyleTransferOptions {
    /// Overlay `map` on the defaults. Unknown keys are rejected.
    pub fn from_map(map: &OptionMap) -> OneShotResult<Self> {
        let value = serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        serde_json::from_value(value)
            .map_err(|e| OneShotError::validation(format!("invalid style transfer option: {e}")))
    }

    /// Options as a key-value map, suitable for the model state.
    pub fn to_map(&self) -> OneShotResult<OptionMap> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(obj) => Ok(obj.into_iter().collect()),
            other => Err(OneShotError::internal(format!(
                "options serialized to a non-object value: {other}"
            ))),
        }
    }

    /// Fill in zero-valued options from the number of style images.
    pub fn infer_derived(&mut self, num_style_images: usize) {
        if self.num_styles == 0 {
            self.num_styles = num_style_images;
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.max_iterations == 0 {
            self.max_iterations = derived_max_iterations(self.num_styles);
        }
    }

    /// Check that the options are usable for training on `num_style_images` styles.
    pub fn validate(&self, num_style_images: usize) -> OneShotResult<()> {
        if self.num_styles != num_style_images {
            return Err(OneShotError::validation(format!(
                "num_styles is {} but {} style images were provided",
                self.num_styles, num_style_images
            )));
        }
        if self.batch_size == 0 || self.max_iterations == 0 {
            return Err(OneShotError::validation(
                "batch_size and max_iterations must be positive after inference",
            ));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(OneShotError::validation(format!(
                "model input size must be non-zero, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        Ok(())
    }
}

/// Iteration count used when `max_iterations` is left at 0.
pub fn derived_max_iterations(num_styles: usize) -> usize {
    match num_styles {
        0..16 => 2000,
        16..64 => 4000,
        _ => 8000,
    }
}

/// Options for exporting a trained model.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Exported input width. Defaults to the training width.
    pub image_width: Option<u32>,
    /// Exported input height. Defaults to the training height.
    pub image_height: Option<u32>,
    /// Allow the exported model to accept other image sizes.
    pub include_flexible_shape: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            image_width: None,
            image_height: None,
            include_flexible_shape: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style_transfer/options.rs"]
mod tests;
