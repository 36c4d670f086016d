// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cropping — rectangles, squares, centred and random squares, and trimming to
// a multiple of a dimension.

use mash_core::config::CropConfig;
use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Rank, Sample};
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::channel;

/// Source of crop origins for [`random_square_crop`].
///
/// Every [`rand::Rng`] is a sampler; tests can substitute a fixed sequence.
pub trait OriginSampler {
    /// Draw uniformly from `0..=max`. Both endpoints must be reachable.
    fn sample_origin(&mut self, max: usize) -> usize;
}

impl<R: Rng + ?Sized> OriginSampler for R {
    fn sample_origin(&mut self, max: usize) -> usize {
        self.random_range(0..=max)
    }
}

/// Parameters of a rectangular crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub crop_height: usize,
    pub crop_width: usize,
    pub start_x: usize,
    pub start_y: usize,
    /// Coerce the output to exactly three channels.
    pub force_rgb: bool,
}

impl CropSpec {
    pub fn apply<T: Sample>(&self, image: &PixelBuffer<T>) -> Result<PixelBuffer<T>> {
        crop_rectangle(
            image,
            self.crop_height,
            self.crop_width,
            self.start_x,
            self.start_y,
            self.force_rgb,
        )
    }
}

/// Crop the rectangle whose top-left corner is `(start_x, start_y)`.
///
/// With `force_rgb` the output always has three channels: RGB input is kept,
/// grayscale is duplicated, and wider inputs are truncated to their first
/// three channels. Otherwise the input's rank and channel count are kept.
///
/// The whole rectangle must fit inside the image; an origin that pushes it
/// past the right or bottom edge is an [`MashError::OutOfBounds`] error.
#[instrument(skip(image), fields(shape = %image.shape()))]
pub fn crop_rectangle<T: Sample>(
    image: &PixelBuffer<T>,
    crop_height: usize,
    crop_width: usize,
    start_x: usize,
    start_y: usize,
    force_rgb: bool,
) -> Result<PixelBuffer<T>> {
    if crop_height == 0 || crop_width == 0 {
        return Err(MashError::InvalidSize(format!(
            "crop size must be positive, got {crop_height}x{crop_width}"
        )));
    }
    if !matches!(image.rank(), Rank::Two | Rank::Three) {
        return Err(MashError::Shape("requires 2D or 3D image".into()));
    }

    let (height, width) = (image.height(), image.width());
    if crop_height > height || crop_width > width {
        return Err(MashError::SizeExceedsBounds {
            crop_height,
            crop_width,
            height,
            width,
        });
    }
    if start_x > width - crop_width || start_y > height - crop_height {
        return Err(MashError::OutOfBounds {
            start_x,
            start_y,
            crop_height,
            crop_width,
            height,
            width,
        });
    }

    let cropped = image.region(start_y, start_x, crop_height, crop_width)?;
    let out = if force_rgb {
        match cropped.channels() {
            3 => cropped.unsqueeze(),
            1 => channel::grayscale_to_rgb(&cropped)?,
            _ => channel::take_channels(&cropped, 3)?,
        }
    } else {
        cropped
    };

    debug!(out = %out.shape(), "Crop complete");
    Ok(out)
}

/// Crop a `crop_size` square whose top-left corner is `(start_x, start_y)`.
pub fn crop_square<T: Sample>(
    image: &PixelBuffer<T>,
    crop_size: usize,
    start_x: usize,
    start_y: usize,
    force_rgb: bool,
) -> Result<PixelBuffer<T>> {
    crop_rectangle(image, crop_size, crop_size, start_x, start_y, force_rgb)
}

/// Crop a `crop_size` square from the centre of the image.
///
/// Odd leftovers are split with floor division, so the crop leans towards the
/// top-left.
#[instrument(skip(image), fields(shape = %image.shape()))]
pub fn center_square_crop<T: Sample>(
    image: &PixelBuffer<T>,
    crop_size: usize,
    force_rgb: bool,
) -> Result<PixelBuffer<T>> {
    validate_square(image, crop_size)?;
    let start_y = (image.height() - crop_size) / 2;
    let start_x = (image.width() - crop_size) / 2;
    crop_square(image, crop_size, start_x, start_y, force_rgb)
}

/// Crop a `crop_size` square at a random position.
///
/// The origin is drawn independently per axis from the full inclusive range
/// of positions where the square still fits.
#[instrument(skip(image, sampler), fields(shape = %image.shape()))]
pub fn random_square_crop<T: Sample, S: OriginSampler + ?Sized>(
    image: &PixelBuffer<T>,
    crop_size: usize,
    force_rgb: bool,
    sampler: &mut S,
) -> Result<PixelBuffer<T>> {
    validate_square(image, crop_size)?;
    let start_y = sampler.sample_origin(image.height() - crop_size);
    let start_x = sampler.sample_origin(image.width() - crop_size);
    debug!(start_x, start_y, "Random crop origin drawn");
    crop_square(image, crop_size, start_x, start_y, force_rgb)
}

/// [`random_square_crop`] using the thread-local generator.
pub fn random_square_crop_thread_rng<T: Sample>(
    image: &PixelBuffer<T>,
    crop_size: usize,
    force_rgb: bool,
) -> Result<PixelBuffer<T>> {
    random_square_crop(image, crop_size, force_rgb, &mut rand::rng())
}

/// Centre crop using the size and output mode from a [`CropConfig`].
pub fn center_crop_with_config<T: Sample>(
    image: &PixelBuffer<T>,
    config: &CropConfig,
) -> Result<PixelBuffer<T>> {
    center_square_crop(image, config.crop_size, config.force_rgb)
}

/// Trim a 3D image so both spatial dimensions are multiples of `multiple`,
/// keeping the retained region centred.
///
/// An axis shorter than `multiple` trims to zero length; that is a valid,
/// empty result rather than an error.
#[instrument(skip(image), fields(shape = %image.shape()))]
pub fn crop_to_multiple_of_dimension<T: Sample>(
    image: &PixelBuffer<T>,
    multiple: usize,
) -> Result<PixelBuffer<T>> {
    if multiple == 0 {
        return Err(MashError::InvalidSize("multiple must be a positive integer".into()));
    }
    if image.rank() != Rank::Three {
        return Err(MashError::Shape("requires 3D image".into()));
    }

    let (height, width) = (image.height(), image.width());
    if height == 0 || width == 0 {
        return Err(MashError::InvalidSize(format!(
            "image dimensions must be positive, got {height}x{width}"
        )));
    }

    let new_height = height - height % multiple;
    let new_width = width - width % multiple;
    let top = (height - new_height) / 2;
    let left = (width - new_width) / 2;

    if new_height == 0 || new_width == 0 {
        warn!(multiple, new_height, new_width, "Image smaller than multiple, result is empty");
    }
    image.region(top, left, new_height, new_width)
}

fn validate_square<T: Sample>(image: &PixelBuffer<T>, crop_size: usize) -> Result<()> {
    if crop_size == 0 {
        return Err(MashError::InvalidSize("side length must be a positive integer".into()));
    }
    if crop_size > image.height() || crop_size > image.width() {
        return Err(MashError::InvalidSize(format!(
            "side length {crop_size} is larger than image dimensions {}x{}",
            image.height(),
            image.width()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mash_core::ErrorKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn arange(height: usize, width: usize) -> PixelBuffer<u8> {
        PixelBuffer::from_2d(height, width, (0..(height * width) as u8).collect()).unwrap()
    }

    /// Replays a fixed list of draws, or the upper bound when `Max`.
    enum Stub {
        Fixed(Vec<usize>),
        Max,
    }

    impl OriginSampler for Stub {
        fn sample_origin(&mut self, max: usize) -> usize {
            match self {
                Self::Fixed(draws) => draws.remove(0).min(max),
                Self::Max => max,
            }
        }
    }

    const SHAPES: [&[usize]; 5] = [&[10, 10], &[10, 10, 1], &[10, 10, 3], &[10, 10, 4], &[10, 10, 8]];

    fn zeros(dims: &[usize]) -> PixelBuffer<f32> {
        let len = dims.iter().product();
        PixelBuffer::from_dims(dims, vec![0.0; len]).unwrap()
    }

    #[test]
    fn crop_square_values() {
        let img = arange(4, 4);
        let top_left = crop_square(&img, 2, 0, 0, false).unwrap();
        assert_eq!(top_left.to_rows(), vec![vec![0, 1], vec![4, 5]]);
        let inner = crop_square(&img, 2, 1, 1, false).unwrap();
        assert_eq!(inner.to_rows(), vec![vec![5, 6], vec![9, 10]]);
    }

    #[test]
    fn center_crop_matches_inner_square() {
        let img = arange(4, 4);
        let center = center_square_crop(&img, 2, false).unwrap();
        assert_eq!(center.to_rows(), vec![vec![5, 6], vec![9, 10]]);
    }

    #[test]
    fn crop_rectangle_values() {
        let img = arange(4, 4);
        let spec = CropSpec {
            crop_height: 2,
            crop_width: 3,
            start_x: 0,
            start_y: 0,
            force_rgb: false,
        };
        assert_eq!(spec.apply(&img).unwrap().to_rows(), vec![vec![0, 1, 2], vec![4, 5, 6]]);
    }

    #[test]
    fn crop_keeps_input_shape() {
        for dims in SHAPES {
            let img = zeros(dims);
            for size in [1, 3, 5] {
                let out = crop_square(&img, size, 4, 2, false).unwrap();
                let mut expected = vec![size, size];
                expected.extend_from_slice(&dims[2..]);
                assert_eq!(out.dims(), expected, "input {dims:?}");
            }
        }
    }

    #[test]
    fn force_rgb_always_yields_three_channels() {
        for dims in SHAPES {
            let img = zeros(dims);
            for size in [1, 3, 5] {
                let out = center_square_crop(&img, size, true).unwrap();
                assert_eq!(out.dims(), vec![size, size, 3], "input {dims:?}");
            }
        }
    }

    #[test]
    fn force_rgb_duplicates_grayscale() {
        let img = arange(4, 4);
        let out = crop_square(&img, 2, 1, 1, true).unwrap();
        assert_eq!(out.pixel(0, 1), &[6, 6, 6]);
    }

    #[test]
    fn force_rgb_truncates_extra_channels() {
        let img = PixelBuffer::from_fn(3, 3, 4, |_, _, c| c as u8).unwrap();
        let out = crop_square(&img, 2, 0, 0, true).unwrap();
        assert_eq!(out.pixel(1, 1), &[0, 1, 2]);
    }

    #[test]
    fn invalid_crops_fail() {
        let img = zeros(&[10, 10, 3]);
        assert_eq!(crop_square(&img, 15, 0, 0, false).unwrap_err().kind(), ErrorKind::SizeExceedsBounds);
        assert_eq!(crop_square(&img, 0, 0, 0, false).unwrap_err().kind(), ErrorKind::InvalidSize);
        assert_eq!(crop_square(&img, 5, 10, 0, false).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(crop_square(&img, 5, 0, 10, false).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(
            crop_rectangle(&img, 2, 0, 0, 0, false).unwrap_err().kind(),
            ErrorKind::InvalidSize
        );
    }

    #[test]
    fn origin_overflow_is_rejected_not_truncated() {
        let img = arange(4, 4);
        let err = crop_rectangle(&img, 2, 2, 3, 0, false).unwrap_err();
        assert!(matches!(err, MashError::OutOfBounds { start_x: 3, .. }));
    }

    #[test]
    fn huge_origin_is_out_of_bounds() {
        let img = arange(4, 4);
        let err = crop_rectangle(&img, 2, 2, usize::MAX, 0, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        let err = crop_rectangle(&img, 2, 2, 0, usize::MAX, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn force_rgb_on_two_channels_is_shape_error() {
        let img = zeros(&[6, 6, 2]);
        let err = center_square_crop(&img, 4, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert_eq!(center_square_crop(&img, 4, false).unwrap().dims(), vec![4, 4, 2]);
    }

    #[test]
    fn center_crop_rejects_bad_sizes() {
        let img = zeros(&[10, 10, 3]);
        assert_eq!(center_square_crop(&img, 15, false).unwrap_err().kind(), ErrorKind::InvalidSize);
        assert_eq!(center_square_crop(&img, 0, false).unwrap_err().kind(), ErrorKind::InvalidSize);
    }

    #[test]
    fn random_crop_reaches_both_endpoints() {
        let img = arange(4, 6);
        let low = random_square_crop(&img, 2, false, &mut Stub::Fixed(vec![0, 0])).unwrap();
        assert_eq!(low.to_rows(), vec![vec![0, 1], vec![6, 7]]);

        let high = random_square_crop(&img, 2, false, &mut Stub::Max).unwrap();
        assert_eq!(high.to_rows(), vec![vec![16, 17], vec![22, 23]]);
    }

    #[test]
    fn random_crop_draws_y_then_x() {
        let img = arange(4, 6);
        let out = random_square_crop(&img, 2, false, &mut Stub::Fixed(vec![1, 3])).unwrap();
        assert_eq!(out.to_rows(), vec![vec![9, 10], vec![15, 16]]);
    }

    #[test]
    fn random_crop_with_seeded_rng_stays_in_bounds() {
        let img = zeros(&[10, 12, 3]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let out = random_square_crop(&img, 4, true, &mut rng).unwrap();
            assert_eq!(out.dims(), vec![4, 4, 3]);
        }
    }

    #[test]
    fn random_crop_rejects_bad_sizes() {
        let img = zeros(&[10, 10]);
        let err = random_square_crop(&img, 11, false, &mut Stub::Max).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSize);
        let err = random_square_crop_thread_rng(&img, 0, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSize);
    }

    #[test]
    fn config_drives_center_crop() {
        let img = zeros(&[10, 10]);
        let config = CropConfig {
            crop_size: 4,
            force_rgb: true,
        };
        assert_eq!(center_crop_with_config(&img, &config).unwrap().dims(), vec![4, 4, 3]);
    }

    #[test]
    fn multiple_of_dimension_is_centred() {
        let img = PixelBuffer::from_fn(15, 25, 3, |y, x, _| (y * 25 + x) as f32).unwrap();
        let out = crop_to_multiple_of_dimension(&img, 4).unwrap();
        assert_eq!(out.dims(), vec![12, 24, 3]);
        // 15 -> 12 leaves offset 1; 25 -> 24 leaves offset 0.
        assert_eq!(out.get(0, 0, 0), img.get(1, 0, 0));
        assert_eq!(out.get(11, 23, 2), img.get(12, 23, 2));
    }

    #[test]
    fn multiple_larger_than_image_gives_empty() {
        let img = zeros(&[3, 8, 3]);
        let out = crop_to_multiple_of_dimension(&img, 4).unwrap();
        assert_eq!(out.dims(), vec![0, 8, 3]);
        assert!(out.is_empty());
    }

    #[test]
    fn multiple_of_dimension_validates() {
        assert_eq!(
            crop_to_multiple_of_dimension(&zeros(&[8, 8, 3]), 0).unwrap_err().kind(),
            ErrorKind::InvalidSize
        );
        assert_eq!(
            crop_to_multiple_of_dimension(&zeros(&[8, 8]), 4).unwrap_err().kind(),
            ErrorKind::Shape
        );
    }
}
