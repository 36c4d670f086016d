// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-side resizing. This module owns the target-size computation; pixel
// interpolation is delegated to a `Resampler`, by default the `image` crate's
// resize filters.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use mash_core::config::{ResampleFilter, ResizeConfig};
use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Sample, SideMethod};
use tracing::{debug, instrument};

/// Added before truncation so that products like `224.0 / 3.0 * 3.0` do not
/// fall just short of the intended integer.
const EPSILON: f64 = 1e-3;

/// Interpolates a buffer to an exact target size.
pub trait Resampler {
    /// Resize `image` to `height` x `width`.
    ///
    /// With `preserve_range` the output keeps the input's numeric range
    /// (0–255 for 8-bit samples); otherwise it is in the unit range.
    fn resample<T: Sample>(
        &self,
        image: &PixelBuffer<T>,
        height: usize,
        width: usize,
        preserve_range: bool,
    ) -> Result<PixelBuffer<f32>>;
}

/// Resampler backed by `image::imageops::resize`.
///
/// Each channel is resampled as a separate `f32` plane, so any channel count
/// is supported. The `image` filters clamp `f32` pixels to 0.0–1.0, so planes
/// that leave the unit range are mapped affinely onto it for the filter and
/// back afterwards; results stay within the plane's own min and max.
#[derive(Debug, Clone, Copy)]
pub struct ImageResampler {
    filter: FilterType,
}

impl ImageResampler {
    pub fn new(filter: ResampleFilter) -> Self {
        Self {
            filter: filter_type(filter),
        }
    }
}

impl Default for ImageResampler {
    fn default() -> Self {
        Self::new(ResampleFilter::default())
    }
}

impl Resampler for ImageResampler {
    fn resample<T: Sample>(
        &self,
        image: &PixelBuffer<T>,
        height: usize,
        width: usize,
        preserve_range: bool,
    ) -> Result<PixelBuffer<f32>> {
        let (src_w, src_h) = (to_u32(image.width())?, to_u32(image.height())?);
        let (dst_w, dst_h) = (to_u32(width)?, to_u32(height)?);
        let channels = image.channels();
        let scale = if preserve_range { T::range_max() } else { 1.0 };

        let mut data = vec![0.0f32; height * width * channels];
        for c in 0..channels {
            let plane: Vec<f32> = image.channel(c).into_iter().map(Sample::to_unit).collect();
            let range = PlaneRange::of(&plane);
            if range.is_flat() {
                for i in 0..height * width {
                    data[i * channels + c] = range.low * scale;
                }
                continue;
            }

            let plane: Vec<f32> = plane.into_iter().map(|v| range.normalize(v)).collect();
            let plane: ImageBuffer<Luma<f32>, Vec<f32>> =
                ImageBuffer::from_raw(src_w, src_h, plane).ok_or_else(|| {
                    MashError::Shape(format!("channel {c} does not match {}", image.shape()))
                })?;
            let resized = imageops::resize(&plane, dst_w, dst_h, self.filter);
            for (i, v) in resized.into_raw().into_iter().enumerate() {
                data[i * channels + c] = range.denormalize(v) * scale;
            }
        }

        Ok(PixelBuffer::new(height, width, channels, data)?.with_rank(image.rank()))
    }
}

/// Value range of one channel plane and its mapping onto the filter's
/// 0.0–1.0 domain. Planes already inside the unit range pass through as-is.
#[derive(Debug, Clone, Copy)]
struct PlaneRange {
    low: f32,
    high: f32,
    in_unit: bool,
}

impl PlaneRange {
    fn of(plane: &[f32]) -> Self {
        let (low, high) = plane
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Self {
            low,
            high,
            in_unit: low >= 0.0 && high <= 1.0,
        }
    }

    fn is_flat(&self) -> bool {
        self.low == self.high
    }

    fn normalize(self, v: f32) -> f32 {
        if self.in_unit { v } else { (v - self.low) / (self.high - self.low) }
    }

    fn denormalize(self, v: f32) -> f32 {
        if self.in_unit {
            v
        } else {
            (v * (self.high - self.low) + self.low).clamp(self.low, self.high)
        }
    }
}

fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Gaussian => FilterType::Gaussian,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| MashError::InvalidSize(format!("dimension {value} exceeds u32 range")))
}

/// Compute the `(height, width)` that pins the side chosen by `method` to
/// `side_length` while keeping the aspect ratio.
///
/// Panics if the rounding leaves the pinned side off target; that indicates a
/// defect in the scaling arithmetic, not bad input.
pub fn target_dimensions(
    height: usize,
    width: usize,
    side_length: usize,
    method: SideMethod,
) -> (usize, usize) {
    let pinned = match method {
        SideMethod::Max => height.max(width),
        SideMethod::Min => height.min(width),
    };
    let scale = side_length as f64 / pinned as f64;
    let new_height = (height as f64 * scale + EPSILON) as usize;
    let new_width = (width as f64 * scale + EPSILON) as usize;

    let pinned_new = if pinned == height { new_height } else { new_width };
    assert_eq!(
        pinned_new, side_length,
        "fixed-side scaling missed target: {height}x{width} -> {new_height}x{new_width}"
    );
    (new_height, new_width)
}

/// Resize so the side chosen by `method` becomes `side_length`, preserving the
/// aspect ratio.
#[instrument(skip(image, resampler), fields(shape = %image.shape()))]
pub fn resize_fixed_side<T: Sample, R: Resampler>(
    image: &PixelBuffer<T>,
    side_length: usize,
    method: SideMethod,
    preserve_range: bool,
    resampler: &R,
) -> Result<PixelBuffer<f32>> {
    if side_length == 0 {
        return Err(MashError::InvalidSize("side length must be a positive integer".into()));
    }
    if image.is_empty() {
        return Err(MashError::Shape(format!("cannot resize empty image {}", image.shape())));
    }

    let (new_height, new_width) =
        target_dimensions(image.height(), image.width(), side_length, method);
    if new_height == 0 || new_width == 0 {
        return Err(MashError::InvalidSize(format!(
            "resizing {} to side {side_length} collapses a dimension to zero",
            image.shape()
        )));
    }

    let resized = resampler.resample(image, new_height, new_width, preserve_range)?;
    debug!(out = %resized.shape(), "Resize complete");
    Ok(resized)
}

/// Resize so the shorter side becomes `min_side_len`.
pub fn resize_image_min_side<T: Sample>(
    image: &PixelBuffer<T>,
    min_side_len: usize,
    preserve_range: bool,
) -> Result<PixelBuffer<f32>> {
    resize_fixed_side(
        image,
        min_side_len,
        SideMethod::Min,
        preserve_range,
        &ImageResampler::default(),
    )
}

/// Resize so the longer side becomes `max_side_len`.
pub fn resize_image_max_side<T: Sample>(
    image: &PixelBuffer<T>,
    max_side_len: usize,
    preserve_range: bool,
) -> Result<PixelBuffer<f32>> {
    resize_fixed_side(
        image,
        max_side_len,
        SideMethod::Max,
        preserve_range,
        &ImageResampler::default(),
    )
}

/// Resize with every parameter taken from a [`ResizeConfig`].
pub fn resize_with_config<T: Sample>(
    image: &PixelBuffer<T>,
    config: &ResizeConfig,
) -> Result<PixelBuffer<f32>> {
    resize_fixed_side(
        image,
        config.side_length,
        config.method,
        config.preserve_range,
        &ImageResampler::new(config.filter),
    )
}
