use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{OneShotError, OneShotResult};

/// Randomization ranges for [`crate::ParameterSampler`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Smallest object size: longer object side as a fraction of the shorter canvas side.
    pub min_scale: f64,
    /// Largest object size, same unit as `min_scale`.
    pub max_scale: f64,
    /// In-plane rotation is drawn from `[-max_rotation_deg, max_rotation_deg]`.
    pub max_rotation_deg: f64,
    /// Out-of-plane tilts about x and y are drawn from `[-max_tilt_deg, max_tilt_deg]`.
    pub max_tilt_deg: f64,
    /// Object centres stay this fraction of the canvas away from its borders.
    pub margin: f64,
    /// Draws rejected before falling back to a centred placement.
    pub max_attempts: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 0.6,
            max_rotation_deg: 20.0,
            max_tilt_deg: 20.0,
            margin: 0.1,
            max_attempts: 32,
        }
    }
}

impl SamplerConfig {
    /// Check ranges.
    pub fn validate(&self) -> OneShotResult<()> {
        if !(self.min_scale.is_finite() && self.max_scale.is_finite()) {
            return Err(OneShotError::validation("sampler scales must be finite"));
        }
        if self.min_scale <= 0.0 || self.min_scale > self.max_scale {
            return Err(OneShotError::validation(format!(
                "sampler scale range must satisfy 0 < min <= max, got [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if !(0.0..180.0).contains(&self.max_rotation_deg) {
            return Err(OneShotError::validation(
                "max_rotation_deg must be in [0, 180)",
            ));
        }
        if !(0.0..80.0).contains(&self.max_tilt_deg) {
            return Err(OneShotError::validation("max_tilt_deg must be in [0, 80)"));
        }
        if !(0.0..0.5).contains(&self.margin) {
            return Err(OneShotError::validation("margin must be in [0, 0.5)"));
        }
        if self.max_attempts == 0 {
            return Err(OneShotError::validation("max_attempts must be >= 1"));
        }
        Ok(())
    }
}

/// Batch augmentation settings, loadable from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    /// Base seed; sample `i` uses sampler row `i`.
    pub seed: u64,
    /// Synthetic images produced per background.
    pub samples_per_background: u32,
    /// Transform randomization.
    pub sampler: SamplerConfig,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            samples_per_background: 1,
            sampler: SamplerConfig::default(),
        }
    }
}

impl AugmentConfig {
    /// Check all settings.
    pub fn validate(&self) -> OneShotResult<()> {
        if self.samples_per_background == 0 {
            return Err(OneShotError::validation(
                "samples_per_background must be >= 1",
            ));
        }
        self.sampler.validate()
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> OneShotResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/augment/config.rs"]
mod tests;
