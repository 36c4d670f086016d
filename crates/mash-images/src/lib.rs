// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mash-images — Geometric and colorimetric transforms over Mash pixel buffers.
//
// Provides cropping (rectangle, square, centre, random, multiple-of-N),
// fixed-side resizing, tiling with overlap, per-channel standardization, and
// channel-count conversion, plus loading/saving through the `image` crate.
// Every transform borrows its input and returns a new buffer.

pub mod channel;
pub mod convert;
pub mod crop;
pub mod normalize;
pub mod resize;
pub mod tile;

// Re-export the primary entry points so callers can use
// `mash_images::center_square_crop` etc.
pub use channel::{grayscale_to_rgb, transparent_to_rgb};
pub use convert::{DynamicBuffer, ImageSource, load, save};
pub use crop::{
    CropSpec, OriginSampler, center_square_crop, crop_rectangle, crop_square,
    crop_to_multiple_of_dimension, random_square_crop,
};
pub use normalize::{PresetRegistry, standardize};
pub use resize::{
    ImageResampler, Resampler, resize_fixed_side, resize_image_max_side, resize_image_min_side,
};
pub use tile::{TileGrid, image_to_tiles};
