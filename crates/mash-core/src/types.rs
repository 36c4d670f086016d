// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the pixel buffer shared by every transform, the sample
// trait describing its element type, and small parameter enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MashError, Result};

// -- Samples ------------------------------------------------------------------

/// Element type of a [`PixelBuffer`].
///
/// Integer samples use the 0–255 range; float samples nominally use 0.0–1.0,
/// though nothing enforces it.
pub trait Sample: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// `true` for integer-valued samples that need rescaling to the unit range.
    const IS_INTEGER: bool;

    /// Short dtype name used in logs.
    const NAME: &'static str;

    /// Value mapped into the unit range (integer samples are divided by 255).
    fn to_unit(self) -> f32;

    /// Inverse of [`Sample::to_unit`], rounding and clamping integer samples.
    fn from_unit(value: f32) -> Self;

    /// Upper bound of the nominal range (255 for `u8`, 1 for floats).
    fn range_max() -> f32 {
        if Self::IS_INTEGER { 255.0 } else { 1.0 }
    }
}

impl Sample for u8 {
    const IS_INTEGER: bool = true;
    const NAME: &'static str = "u8";

    #[inline]
    fn to_unit(self) -> f32 {
        f32::from(self) / 255.0
    }

    #[inline]
    fn from_unit(value: f32) -> Self {
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

impl Sample for f32 {
    const IS_INTEGER: bool = false;
    const NAME: &'static str = "f32";

    #[inline]
    fn to_unit(self) -> f32 {
        self
    }

    #[inline]
    fn from_unit(value: f32) -> Self {
        value
    }
}

impl Sample for f64 {
    const IS_INTEGER: bool = false;
    const NAME: &'static str = "f64";

    #[inline]
    fn to_unit(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_unit(value: f32) -> Self {
        f64::from(value)
    }
}

// -- Shape --------------------------------------------------------------------

/// How a buffer was presented by the caller.
///
/// Storage is always `(height, width, channels)`; a [`Rank::Two`] buffer is a
/// single-channel buffer that should come back out without a channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
}

/// Dimensions of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

// -- PixelBuffer --------------------------------------------------------------

/// Owned, row-major, channel-interleaved image buffer.
///
/// Sample `(y, x, c)` lives at `(y * width + x) * channels + c`. Buffers are
/// values: transforms borrow their input and return a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    height: usize,
    width: usize,
    channels: usize,
    rank: Rank,
    data: Vec<T>,
}

impl<T: Sample> PixelBuffer<T> {
    // -- Construction ---------------------------------------------------------

    /// Build a 3D buffer of shape `(height, width, channels)`.
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<T>) -> Result<Self> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(MashError::Shape(format!(
                "dimensions must be positive, got {height}x{width}x{channels}"
            )));
        }
        check_len(height, width, channels, data.len())?;
        Ok(Self {
            height,
            width,
            channels,
            rank: Rank::Three,
            data,
        })
    }

    /// Build a 2D (single-channel, no channel axis) buffer.
    pub fn from_2d(height: usize, width: usize, data: Vec<T>) -> Result<Self> {
        Self::new(height, width, 1, data).map(Self::squeeze)
    }

    /// Build a buffer from numpy-style dimensions: `[h, w]` or `[h, w, c]`.
    pub fn from_dims(dims: &[usize], data: Vec<T>) -> Result<Self> {
        match *dims {
            [h, w] => Self::from_2d(h, w, data),
            [h, w, c] => Self::new(h, w, c, data),
            _ => Err(MashError::Shape(format!(
                "requires 2D or 3D array, got {}D",
                dims.len()
            ))),
        }
    }

    /// Build a 3D buffer by evaluating `f(y, x, c)` for every sample.
    pub fn from_fn(
        height: usize,
        width: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> T,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(height * width * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(f(y, x, c));
                }
            }
        }
        Self::new(height, width, channels, data)
    }

    /// Build a 3D buffer where every sample equals `value`.
    pub fn filled(height: usize, width: usize, channels: usize, value: T) -> Result<Self> {
        Self::new(height, width, channels, vec![value; height * width * channels])
    }

    // -- Accessors ------------------------------------------------------------

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn shape(&self) -> Shape {
        Shape {
            height: self.height,
            width: self.width,
            channels: self.channels,
        }
    }

    /// Numpy-style dimensions honouring the presented rank.
    pub fn dims(&self) -> Vec<usize> {
        match self.rank {
            Rank::Two => vec![self.height, self.width],
            Rank::Three => vec![self.height, self.width, self.channels],
        }
    }

    /// `true` when either spatial extent is zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn index(&self, y: usize, x: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    /// Sample at row `y`, column `x`, channel `c`.
    ///
    /// Panics when the coordinates are out of range.
    #[inline]
    pub fn get(&self, y: usize, x: usize, c: usize) -> T {
        assert!(y < self.height && x < self.width && c < self.channels);
        self.data[self.index(y, x, c)]
    }

    /// All channels of the pixel at `(y, x)`.
    ///
    /// Panics when the coordinates are out of range.
    #[inline]
    pub fn pixel(&self, y: usize, x: usize) -> &[T] {
        assert!(y < self.height && x < self.width, "pixel ({y}, {x}) out of range");
        let start = self.index(y, x, 0);
        &self.data[start..start + self.channels]
    }

    /// Interleaved samples in row-major order.
    pub fn samples(&self) -> &[T] {
        &self.data
    }

    pub fn into_samples(self) -> Vec<T> {
        self.data
    }

    /// Copy out a single channel as a `height * width` plane.
    pub fn channel(&self, c: usize) -> Vec<T> {
        assert!(c < self.channels, "channel {c} out of range");
        self.data
            .iter()
            .skip(c)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Rows as nested vectors of samples, convenient for comparisons.
    ///
    /// Only meaningful for single-channel buffers; multi-channel buffers
    /// yield interleaved rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        let row_len = self.width * self.channels;
        if row_len == 0 {
            return vec![Vec::new(); self.height];
        }
        self.data.chunks(row_len).map(<[T]>::to_vec).collect()
    }

    // -- Rank -----------------------------------------------------------------

    /// Present a single-channel buffer without its channel axis. Buffers with
    /// more than one channel are returned unchanged.
    pub fn squeeze(mut self) -> Self {
        if self.channels == 1 {
            self.rank = Rank::Two;
        }
        self
    }

    /// Present the buffer with an explicit channel axis.
    pub fn unsqueeze(mut self) -> Self {
        self.rank = Rank::Three;
        self
    }

    /// Re-present this buffer with `rank`, squeezing only when possible.
    pub fn with_rank(self, rank: Rank) -> Self {
        match rank {
            Rank::Two => self.squeeze(),
            Rank::Three => self.unsqueeze(),
        }
    }

    // -- Derivation -----------------------------------------------------------

    /// Copy the region `[top..top+height, left..left+width, :]`.
    ///
    /// Zero extents are allowed and produce an empty buffer with the same
    /// channel count and rank. The region must lie within the buffer.
    pub fn region(&self, top: usize, left: usize, height: usize, width: usize) -> Result<Self> {
        let bottom = top.checked_add(height);
        let right = left.checked_add(width);
        if bottom.is_none_or(|end| end > self.height) || right.is_none_or(|end| end > self.width) {
            return Err(MashError::OutOfBounds {
                start_x: left,
                start_y: top,
                crop_height: height,
                crop_width: width,
                height: self.height,
                width: self.width,
            });
        }
        let row_len = width * self.channels;
        let mut data = Vec::with_capacity(height * row_len);
        for y in top..top + height {
            let start = self.index(y, left, 0);
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Ok(Self {
            height,
            width,
            channels: self.channels,
            rank: self.rank,
            data,
        })
    }

    /// Keep the first `count` channels of every pixel. The result is 3D.
    pub fn select_channels(&self, count: usize) -> Result<Self> {
        if count == 0 || count > self.channels {
            return Err(MashError::Shape(format!(
                "cannot keep {count} of {} channels",
                self.channels
            )));
        }
        let data = self
            .data
            .chunks(self.channels)
            .flat_map(|px| px[..count].iter().copied())
            .collect();
        Ok(Self {
            height: self.height,
            width: self.width,
            channels: count,
            rank: Rank::Three,
            data,
        })
    }

    /// Repeat every pixel's channels `times` times along the channel axis.
    pub fn repeat_channels(&self, times: usize) -> Result<Self> {
        if times == 0 {
            return Err(MashError::InvalidSize("repeat count must be positive".into()));
        }
        let data = self
            .data
            .chunks(self.channels)
            .flat_map(|px| std::iter::repeat_n(px, times).flatten().copied())
            .collect();
        Ok(Self {
            height: self.height,
            width: self.width,
            channels: self.channels * times,
            rank: Rank::Three,
            data,
        })
    }

    /// Elementwise conversion preserving shape and rank.
    pub fn map<U: Sample>(&self, f: impl Fn(T) -> U) -> PixelBuffer<U> {
        self.map_channels(|_, v| f(v))
    }

    /// Elementwise conversion where `f` also receives the channel index.
    pub fn map_channels<U: Sample>(&self, f: impl Fn(usize, T) -> U) -> PixelBuffer<U> {
        let channels = self.channels;
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &v)| f(i % channels, v))
            .collect();
        PixelBuffer {
            height: self.height,
            width: self.width,
            channels,
            rank: self.rank,
            data,
        }
    }
}

fn check_len(height: usize, width: usize, channels: usize, len: usize) -> Result<()> {
    let expected = height * width * channels;
    if len != expected {
        return Err(MashError::Shape(format!(
            "{height}x{width}x{channels} buffer needs {expected} samples, got {len}"
        )));
    }
    Ok(())
}

// -- Parameters ---------------------------------------------------------------

/// Which image side a fixed-side resize pins to the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideMethod {
    /// The longer side becomes the requested length.
    #[default]
    Max,
    /// The shorter side becomes the requested length.
    Min,
}

impl FromStr for SideMethod {
    type Err = MashError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(MashError::InvalidArgument(format!(
                "invalid method '{other}', choose 'max' or 'min'"
            ))),
        }
    }
}

impl fmt::Display for SideMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Min => write!(f, "min"),
        }
    }
}
