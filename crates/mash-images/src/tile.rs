// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tiling — split an image into a row-major grid of equally sized tiles with
// optional overlap.

use mash_core::config::TileConfig;
use mash_core::dims::{dimension_from_f64, overlap_from_f64};
use mash_core::error::{MashError, Result};
use mash_core::{PixelBuffer, Sample};
use tracing::{debug, instrument, warn};

/// Validated tiling layout.
///
/// The stride along an axis is the tile size minus the overlap (or the tile
/// size when no overlap is given) and is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    tile_width: usize,
    tile_height: usize,
    overlap_width: Option<usize>,
    overlap_height: Option<usize>,
}

impl TileGrid {
    pub fn new(
        tile_width: usize,
        tile_height: usize,
        overlap_width: Option<usize>,
        overlap_height: Option<usize>,
    ) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(MashError::InvalidSize(format!(
                "tile width and height must be positive integers, got {tile_width}x{tile_height}"
            )));
        }
        if overlap_width.is_some_and(|o| o >= tile_width)
            || overlap_height.is_some_and(|o| o >= tile_height)
        {
            return Err(MashError::InvalidSize(
                "overlap must be less than the dimensions of the tile".into(),
            ));
        }
        Ok(Self {
            tile_width,
            tile_height,
            overlap_width,
            overlap_height,
        })
    }

    /// Build a grid from untyped numbers, rejecting fractional tile sizes with
    /// [`MashError::TypeMismatch`] and negative or fractional overlaps with
    /// [`MashError::InvalidSize`].
    pub fn from_untyped(
        tile_width: f64,
        tile_height: f64,
        overlap_width: Option<f64>,
        overlap_height: Option<f64>,
    ) -> Result<Self> {
        if tile_width <= 0.0 || tile_height <= 0.0 {
            return Err(MashError::InvalidSize(format!(
                "tile width and height must be positive integers, got {tile_width}x{tile_height}"
            )));
        }
        let tile_width = dimension_from_f64("tile_width", tile_width, false)?;
        let tile_height = dimension_from_f64("tile_height", tile_height, false)?;
        let overlap_width = overlap_width
            .map(|o| overlap_from_f64("overlap_width", o))
            .transpose()?;
        let overlap_height = overlap_height
            .map(|o| overlap_from_f64("overlap_height", o))
            .transpose()?;
        Self::new(tile_width, tile_height, overlap_width, overlap_height)
    }

    /// Build a grid from the `tiles` section of a config file.
    pub fn from_config(config: &TileConfig) -> Result<Self> {
        Self::from_untyped(
            config.tile_width,
            config.tile_height,
            config.overlap_width,
            config.overlap_height,
        )
    }

    pub fn tile_width(&self) -> usize {
        self.tile_width
    }

    pub fn tile_height(&self) -> usize {
        self.tile_height
    }

    /// `(stride_x, stride_y)`.
    pub fn strides(&self) -> (usize, usize) {
        (
            self.tile_width - self.overlap_width.unwrap_or(0),
            self.tile_height - self.overlap_height.unwrap_or(0),
        )
    }

    /// Number of `(rows, columns)` that fit in a `height` x `width` image.
    pub fn counts(&self, height: usize, width: usize) -> (usize, usize) {
        let (stride_x, stride_y) = self.strides();
        let rows = match self.overlap_height {
            Some(overlap) => height.saturating_sub(overlap) / stride_y,
            None => height / self.tile_height,
        };
        let cols = match self.overlap_width {
            Some(overlap) => width.saturating_sub(overlap) / stride_x,
            None => width / self.tile_width,
        };
        (rows, cols)
    }

    /// Top-left `(y, x)` of every tile, row by row.
    pub fn tile_origins(&self, height: usize, width: usize) -> Vec<(usize, usize)> {
        let (stride_x, stride_y) = self.strides();
        let (rows, cols) = self.counts(height, width);
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row * stride_y, col * stride_x)))
            .collect()
    }

    /// Cut `image` into tiles, row by row. Tiles keep the image's rank and
    /// channel count. A tile larger than the image yields no tiles.
    pub fn split<T: Sample>(&self, image: &PixelBuffer<T>) -> Result<Vec<PixelBuffer<T>>> {
        self.tile_origins(image.height(), image.width())
            .into_iter()
            .map(|(y, x)| image.region(y, x, self.tile_height, self.tile_width))
            .collect()
    }
}

/// Split `image` into `tile_width` x `tile_height` tiles with optional
/// overlap, in row-major order.
#[instrument(skip(image), fields(shape = %image.shape()))]
pub fn image_to_tiles<T: Sample>(
    image: &PixelBuffer<T>,
    tile_width: usize,
    tile_height: usize,
    overlap_width: Option<usize>,
    overlap_height: Option<usize>,
) -> Result<Vec<PixelBuffer<T>>> {
    let grid = TileGrid::new(tile_width, tile_height, overlap_width, overlap_height)?;
    let tiles = grid.split(image)?;
    if tiles.is_empty() {
        warn!("Tile larger than image, no tiles produced");
    }
    debug!(count = tiles.len(), "Tiling complete");
    Ok(tiles)
}
