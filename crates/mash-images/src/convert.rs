// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and exporting pixel buffers through the `image` crate.
//
// Sources form a closed set: a file path, an already-built buffer, or a
// decoded `DynamicImage`. Decoding itself is the `image` crate's job; this
// module only maps decoded pixels to and from `PixelBuffer`.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, ImageBuffer};
use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Sample, Shape};
use tracing::{debug, info, instrument};

/// A pixel buffer whose sample type is only known at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicBuffer {
    /// 8-bit decoded images.
    U8(PixelBuffer<u8>),
    /// 16-bit and float decoded images, scaled to 0.0–1.0.
    F32(PixelBuffer<f32>),
}

impl DynamicBuffer {
    pub fn shape(&self) -> Shape {
        match self {
            Self::U8(buffer) => buffer.shape(),
            Self::F32(buffer) => buffer.shape(),
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::U8(buffer) => buffer.dims(),
            Self::F32(buffer) => buffer.dims(),
        }
    }

    pub fn as_u8(&self) -> Option<&PixelBuffer<u8>> {
        match self {
            Self::U8(buffer) => Some(buffer),
            Self::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&PixelBuffer<f32>> {
        match self {
            Self::F32(buffer) => Some(buffer),
            Self::U8(_) => None,
        }
    }

    /// Convert to `f32` samples in the unit range.
    pub fn into_unit_f32(self) -> PixelBuffer<f32> {
        match self {
            Self::U8(buffer) => buffer.map(Sample::to_unit),
            Self::F32(buffer) => buffer,
        }
    }
}

impl From<PixelBuffer<u8>> for DynamicBuffer {
    fn from(buffer: PixelBuffer<u8>) -> Self {
        Self::U8(buffer)
    }
}

impl From<PixelBuffer<f32>> for DynamicBuffer {
    fn from(buffer: PixelBuffer<f32>) -> Self {
        Self::F32(buffer)
    }
}

/// Where a buffer comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Path to an encoded image on disk.
    Path(PathBuf),
    /// A buffer that is already in memory.
    Raw(DynamicBuffer),
    /// An image decoded by the `image` crate.
    Dynamic(DynamicImage),
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Dynamic(image)
    }
}

impl From<DynamicBuffer> for ImageSource {
    fn from(buffer: DynamicBuffer) -> Self {
        Self::Raw(buffer)
    }
}

/// Produce a pixel buffer from any supported source.
///
/// Remote URLs are not fetched; pass a downloaded file instead.
pub fn load(source: impl Into<ImageSource>) -> Result<DynamicBuffer> {
    match source.into() {
        ImageSource::Path(path) => open(&path),
        ImageSource::Raw(buffer) => Ok(buffer),
        ImageSource::Dynamic(image) => from_dynamic_image(image),
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
fn open(path: &Path) -> Result<DynamicBuffer> {
    let text = path.to_string_lossy();
    if text.starts_with("http://") || text.starts_with("https://") {
        return Err(MashError::UnsupportedInputType(format!(
            "remote URL {text}; only local files can be loaded"
        )));
    }
    let image = image::open(path).map_err(|err| {
        MashError::ImageError(format!("failed to open {}: {}", path.display(), err))
    })?;
    info!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Image loaded"
    );
    from_dynamic_image(image)
}

/// Map a decoded image to a buffer. Grayscale images become 2D buffers;
/// 16-bit and float images are scaled to the unit range.
pub fn from_dynamic_image(image: DynamicImage) -> Result<DynamicBuffer> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let buffer: DynamicBuffer = match image.color() {
        ColorType::L8 => PixelBuffer::from_2d(height, width, image.into_luma8().into_raw())?.into(),
        ColorType::La8 => {
            PixelBuffer::new(height, width, 2, image.into_luma_alpha8().into_raw())?.into()
        }
        ColorType::Rgb8 => PixelBuffer::new(height, width, 3, image.into_rgb8().into_raw())?.into(),
        ColorType::Rgba8 => {
            PixelBuffer::new(height, width, 4, image.into_rgba8().into_raw())?.into()
        }
        ColorType::L16 => PixelBuffer::from_2d(height, width, image.to_luma32f().into_raw())?.into(),
        ColorType::La16 => {
            PixelBuffer::new(height, width, 2, image.to_luma_alpha32f().into_raw())?.into()
        }
        ColorType::Rgb16 | ColorType::Rgb32F => {
            PixelBuffer::new(height, width, 3, image.to_rgb32f().into_raw())?.into()
        }
        ColorType::Rgba16 | ColorType::Rgba32F => {
            PixelBuffer::new(height, width, 4, image.to_rgba32f().into_raw())?.into()
        }
        other => {
            return Err(MashError::UnsupportedInputType(format!(
                "color type {other:?}"
            )));
        }
    };
    Ok(buffer)
}

/// Map a buffer to an 8-bit `DynamicImage`.
///
/// Float samples are treated as unit range, scaled by 255, rounded and
/// clamped. Only 1 to 4 channels have an image representation.
pub fn to_dynamic_image(buffer: &DynamicBuffer) -> Result<DynamicImage> {
    let bytes = match buffer {
        DynamicBuffer::U8(buffer) => buffer.clone(),
        DynamicBuffer::F32(buffer) => buffer.map(u8::from_unit),
    };
    let shape = bytes.shape();
    let (width, height) = (
        u32::try_from(shape.width).map_err(|_| too_large(shape))?,
        u32::try_from(shape.height).map_err(|_| too_large(shape))?,
    );
    let data = bytes.into_samples();
    let mismatch = || MashError::Shape(format!("sample count does not match {shape}"));

    let image = match shape.channels {
        1 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?),
        2 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?),
        3 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?),
        4 => DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?),
        n => {
            return Err(MashError::UnsupportedInputType(format!(
                "{n}-channel buffer has no image representation"
            )));
        }
    };
    debug!(%shape, "Buffer converted to image");
    Ok(image)
}

fn too_large(shape: Shape) -> MashError {
    MashError::InvalidSize(format!("{shape} exceeds image dimension limits"))
}

/// Write a buffer to a file. The format is inferred from the file extension.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn save(buffer: &DynamicBuffer, path: impl AsRef<Path>) -> Result<()> {
    let image = to_dynamic_image(buffer)?;
    image.save(path.as_ref()).map_err(|err| {
        MashError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, Rgb32FImage, RgbaImage};
    use mash_core::ErrorKind;

    #[test]
    fn grayscale_image_becomes_2d_buffer() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(y * 3 + x) as u8]));
        let buffer = load(DynamicImage::ImageLuma8(gray)).unwrap();
        let buffer = buffer.as_u8().unwrap();
        assert_eq!(buffer.dims(), vec![2, 3]);
        assert_eq!(buffer.to_rows(), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn rgba_image_keeps_four_channels() {
        let rgba = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 40]));
        let buffer = load(DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(buffer.dims(), vec![4, 4, 4]);
        assert_eq!(buffer.as_u8().unwrap().pixel(3, 3), &[10, 20, 30, 40]);
    }

    #[test]
    fn float_image_becomes_f32_buffer() {
        let rgb = Rgb32FImage::from_pixel(2, 2, Rgb([0.25, 0.5, 0.75]));
        let buffer = load(DynamicImage::ImageRgb32F(rgb)).unwrap();
        assert_eq!(buffer.as_f32().unwrap().pixel(0, 1), &[0.25, 0.5, 0.75]);
    }

    #[test]
    fn raw_buffer_passes_through() {
        let raw: DynamicBuffer = PixelBuffer::filled(2, 2, 3, 9u8).unwrap().into();
        assert_eq!(load(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn remote_urls_are_rejected() {
        let err = load(PathBuf::from("https://example.com/cat.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedInputType);
    }

    #[test]
    fn missing_file_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("missing.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Image);
    }

    #[test]
    fn png_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.png");
        let buffer: DynamicBuffer = PixelBuffer::from_fn(5, 7, 3, |y, x, c| (y * 40 + x * 5 + c) as u8)
            .unwrap()
            .into();

        save(&buffer, &path).unwrap();
        let loaded = load(path.as_path()).unwrap();
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn float_buffer_is_scaled_to_bytes() {
        let buffer: DynamicBuffer = PixelBuffer::from_2d(1, 3, vec![0.0f32, 0.5, 2.0]).unwrap().into();
        let image = to_dynamic_image(&buffer).unwrap();
        assert_eq!(image.as_luma8().unwrap().as_raw(), &vec![0u8, 128, 255]);
    }

    #[test]
    fn wide_buffers_have_no_image_form() {
        let buffer: DynamicBuffer = PixelBuffer::filled(2, 2, 5, 0u8).unwrap().into();
        let err = to_dynamic_image(&buffer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedInputType);
    }

    #[test]
    fn unit_conversion_of_bytes() {
        let buffer: DynamicBuffer = PixelBuffer::from_2d(1, 2, vec![0u8, 255]).unwrap().into();
        assert_eq!(buffer.into_unit_f32().samples(), &[0.0, 1.0]);
    }
}
