// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MashError, Result};
use crate::types::SideMethod;

/// Default side length for fixed-side resizing and square crops.
pub const DEFAULT_SIDE_LENGTH: usize = 224;

/// Persistent transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Fixed-side resize settings.
    pub resize: ResizeConfig,
    /// Square crop settings.
    pub crop: CropConfig,
    /// Tiling layout. Values are validated when the grid is built, so
    /// fractional or negative entries survive parsing and fail later.
    pub tiles: Option<TileConfig>,
    /// Extra standardization presets, merged over the built-in ones.
    pub presets: BTreeMap<String, Preset>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            resize: ResizeConfig::default(),
            crop: CropConfig::default(),
            tiles: None,
            presets: BTreeMap::new(),
        }
    }
}

impl TransformConfig {
    /// Parse a configuration from a JSON document. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        for (name, preset) in &config.presets {
            preset.validate(name)?;
        }
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fixed-side resize settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Target length of the side selected by `method`.
    pub side_length: usize,
    /// Which side is pinned to `side_length`.
    pub method: SideMethod,
    /// Keep the input's numeric range (0–255 for 8-bit input) in the output.
    pub preserve_range: bool,
    /// Interpolation filter used by the resampler.
    pub filter: ResampleFilter,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            side_length: DEFAULT_SIDE_LENGTH,
            method: SideMethod::Max,
            preserve_range: true,
            filter: ResampleFilter::Triangle,
        }
    }
}

/// Interpolation filters understood by the resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

/// Square crop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Side length of the square crop.
    pub crop_size: usize,
    /// Coerce the output to exactly three channels.
    pub force_rgb: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            crop_size: DEFAULT_SIDE_LENGTH,
            force_rgb: false,
        }
    }
}

/// Untyped tiling layout as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    pub tile_width: f64,
    pub tile_height: f64,
    #[serde(default)]
    pub overlap_width: Option<f64>,
    #[serde(default)]
    pub overlap_height: Option<f64>,
}

/// Named per-channel mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Preset {
    /// Build a preset, checking that it can be applied.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        let preset = Self { mean, std };
        preset.validate("preset")?;
        Ok(preset)
    }

    /// Number of channels this preset describes.
    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    /// Mean and std must be non-empty, equally long, and std must be non-zero.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.mean.is_empty() || self.mean.len() != self.std.len() {
            return Err(MashError::InvalidArgument(format!(
                "preset '{name}' needs equally long, non-empty mean and std (got {} and {})",
                self.mean.len(),
                self.std.len()
            )));
        }
        if self.std.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(MashError::InvalidArgument(format!(
                "preset '{name}' has a zero or non-finite standard deviation"
            )));
        }
        Ok(())
    }
}
