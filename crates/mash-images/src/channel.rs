// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Channel-count conversions: grayscale to RGB by channel duplication, and
// RGBA to RGB by dropping alpha.

use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Rank, Sample};
use tracing::{debug, instrument};

/// Convert a grayscale buffer to RGB by duplicating its only channel.
///
/// Accepts 2D buffers and 3D buffers with a single channel. The output is 3D
/// with three identical channels and the same dtype.
#[instrument(skip_all, fields(shape = %image.shape()))]
pub fn grayscale_to_rgb<T: Sample>(image: &PixelBuffer<T>) -> Result<PixelBuffer<T>> {
    if image.channels() != 1 {
        return Err(MashError::Shape(format!(
            "grayscale input must have 1 channel, got {}",
            image.channels()
        )));
    }
    let rgb = image.repeat_channels(3)?;
    debug!(out = %rgb.shape(), "Grayscale expanded to RGB");
    Ok(rgb)
}

/// Convert an RGBA buffer to RGB by dropping the fourth channel.
///
/// No alpha compositing is done; the colour channels are kept as they are.
#[instrument(skip_all, fields(shape = %image.shape()))]
pub fn transparent_to_rgb<T: Sample>(image: &PixelBuffer<T>) -> Result<PixelBuffer<T>> {
    if image.rank() != Rank::Three {
        return Err(MashError::Shape("transparent input must be 3D".into()));
    }
    if image.channels() != 4 {
        return Err(MashError::Shape(format!(
            "transparent input must have 4 channels, got {}",
            image.channels()
        )));
    }
    image.select_channels(3)
}

/// Keep the first `count` channels of every pixel.
pub fn take_channels<T: Sample>(image: &PixelBuffer<T>, count: usize) -> Result<PixelBuffer<T>> {
    if count == 0 {
        return Err(MashError::InvalidSize("channel count must be positive".into()));
    }
    image.select_channels(count)
}
