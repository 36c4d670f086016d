// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-channel standardization against named dataset presets or explicit
// statistics.

use std::collections::BTreeMap;

use mash_core::config::{Preset, TransformConfig};
use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Sample};
use tracing::{debug, instrument};

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Immutable lookup of standardization presets by dataset name.
///
/// Build one up front and pass it by reference to [`standardize`].
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    /// Registry holding only the built-in presets (`"imagenet"`).
    pub fn builtin() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(
            "imagenet".to_string(),
            Preset {
                mean: IMAGENET_MEAN.to_vec(),
                std: IMAGENET_STD.to_vec(),
            },
        );
        Self { presets }
    }

    /// Built-in presets plus those declared in `config`; config entries
    /// replace built-ins of the same name.
    pub fn from_config(config: &TransformConfig) -> Result<Self> {
        config
            .presets
            .iter()
            .try_fold(Self::builtin(), |registry, (name, preset)| {
                registry.with_preset(name, preset.clone())
            })
    }

    /// Add or replace a preset.
    pub fn with_preset(mut self, name: impl Into<String>, preset: Preset) -> Result<Self> {
        let name = name.into();
        preset.validate(&name)?;
        self.presets.insert(name, preset);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Standardize each channel as `(value - mean[c]) / std[c]`.
///
/// Exactly one of `dataset` or the `mean`/`std` pair must be given; a
/// `dataset` combined with either `mean` or `std` alone is still
/// [`MashError::ConflictingArguments`]. 8-bit
/// samples are first scaled to 0.0–1.0. The output has the input's shape and
/// rank.
#[instrument(skip(image, registry, mean, std), fields(shape = %image.shape()))]
pub fn standardize<T: Sample>(
    image: &PixelBuffer<T>,
    registry: &PresetRegistry,
    dataset: Option<&str>,
    mean: Option<&[f32]>,
    std: Option<&[f32]>,
) -> Result<PixelBuffer<f32>> {
    let (mean, std) = match (dataset, mean, std) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            return Err(MashError::ConflictingArguments);
        }
        (Some(name), None, None) => {
            let preset = registry
                .get(name)
                .ok_or_else(|| MashError::UnknownPreset(name.to_string()))?;
            (preset.mean.as_slice(), preset.std.as_slice())
        }
        (None, Some(mean), Some(std)) => (mean, std),
        (None, _, _) => return Err(MashError::MissingArguments),
    };

    let channels = image.channels();
    if mean.len() != channels || std.len() != channels {
        return Err(MashError::ChannelMismatch {
            expected: mean.len().max(std.len()),
            actual: channels,
        });
    }

    let out = image.map_channels(|c, v| (v.to_unit() - mean[c]) / std[c]);
    debug!(dtype = T::NAME, "Standardization complete");
    Ok(out)
}

/// Per-channel mean and population standard deviation, computed on the
/// unit-range values [`standardize`] operates on.
pub fn channel_statistics<T: Sample>(image: &PixelBuffer<T>) -> (Vec<f32>, Vec<f32>) {
    let channels = image.channels();
    let count = (image.height() * image.width()).max(1) as f64;

    let mut sums = vec![0.0f64; channels];
    for (i, v) in image.samples().iter().enumerate() {
        sums[i % channels] += f64::from(v.to_unit());
    }
    let means: Vec<f64> = sums.iter().map(|s| s / count).collect();

    let mut squares = vec![0.0f64; channels];
    for (i, v) in image.samples().iter().enumerate() {
        let d = f64::from(v.to_unit()) - means[i % channels];
        squares[i % channels] += d * d;
    }

    (
        means.iter().map(|&m| m as f32).collect(),
        squares.iter().map(|&s| (s / count).sqrt() as f32).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mash_core::ErrorKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(height: usize, width: usize, channels: usize) -> PixelBuffer<u8> {
        let mut rng = StdRng::seed_from_u64(42);
        PixelBuffer::from_fn(height, width, channels, |_, _, _| rng.random::<u8>()).unwrap()
    }

    #[test]
    fn own_statistics_give_zero_mean_unit_std() {
        let img = noise(32, 48, 3);
        let (mean, std) = channel_statistics(&img);
        let registry = PresetRegistry::builtin();
        let out = standardize(&img, &registry, None, Some(mean.as_slice()), Some(std.as_slice())).unwrap();

        let (out_mean, out_std) = channel_statistics(&out);
        for c in 0..3 {
            assert!(out_mean[c].abs() < 1e-2, "mean {c}: {}", out_mean[c]);
            assert!((out_std[c] - 1.0).abs() < 1e-2, "std {c}: {}", out_std[c]);
        }
    }

    #[test]
    fn imagenet_preset_applies() {
        let img = PixelBuffer::filled(2, 2, 3, 255u8).unwrap();
        let out = standardize(&img, &PresetRegistry::default(), Some("imagenet"), None, None).unwrap();
        let expected: Vec<f32> = (0..3).map(|c| (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c]).collect();
        assert_eq!(out.pixel(1, 1), expected.as_slice());
    }

    #[test]
    fn float_input_is_not_rescaled() {
        let img = PixelBuffer::from_2d(1, 2, vec![0.5f32, 1.5]).unwrap();
        let out = standardize(&img, &PresetRegistry::builtin(), None, Some(&[0.5][..]), Some(&[0.5][..])).unwrap();
        assert_eq!(out.samples(), &[0.0, 2.0]);
        assert_eq!(out.dims(), vec![1, 2]);
    }

    #[test]
    fn argument_contract() {
        let img = PixelBuffer::filled(2, 2, 3, 0u8).unwrap();
        let registry = PresetRegistry::builtin();
        let m = &IMAGENET_MEAN[..];
        let s = &IMAGENET_STD[..];

        let err = standardize(&img, &registry, Some("imagenet"), Some(m), Some(s)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictingArguments);
        let err = standardize(&img, &registry, Some("imagenet"), Some(m), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictingArguments);
        let err = standardize(&img, &registry, None, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArguments);
        let err = standardize(&img, &registry, None, Some(m), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArguments);
        let err = standardize(&img, &registry, Some("cifar"), None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPreset);
    }

    #[test]
    fn channel_count_must_match() {
        let gray = PixelBuffer::filled(2, 2, 1, 0u8).unwrap();
        let err = standardize(&gray, &PresetRegistry::builtin(), Some("imagenet"), None, None)
            .unwrap_err();
        assert!(matches!(err, MashError::ChannelMismatch { expected: 3, actual: 1 }));

        let rgb = PixelBuffer::filled(2, 2, 3, 0u8).unwrap();
        let err = standardize(&rgb, &PresetRegistry::builtin(), None, Some(&[0.5; 3][..]), Some(&[0.5; 2][..]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChannelMismatch);
    }

    #[test]
    fn registry_merges_config_presets() {
        let config = TransformConfig::from_json_str(
            r#"{ "presets": { "gray": { "mean": [0.5], "std": [0.5] } } }"#,
        )
        .unwrap();
        let registry = PresetRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["gray", "imagenet"]);

        let gray = PixelBuffer::from_2d(1, 1, vec![255u8]).unwrap();
        let out = standardize(&gray, &registry, Some("gray"), None, None).unwrap();
        assert_eq!(out.samples(), &[1.0]);
    }

    #[test]
    fn registry_rejects_invalid_preset() {
        let bad = Preset {
            mean: vec![0.5, 0.5],
            std: vec![1.0],
        };
        let err = PresetRegistry::builtin().with_preset("bad", bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
