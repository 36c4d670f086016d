// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Mash.

use thiserror::Error;

/// Top-level error type for all Mash operations.
///
/// Every variant is a user-input failure detected before any output buffer is
/// allocated. Internal invariant violations are panics, not errors.
#[derive(Debug, Error)]
pub enum MashError {
    // -- Parameter errors --
    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error("expected whole number for {name}, got {value}")]
    TypeMismatch { name: String, value: f64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Shape errors --
    #[error("unsupported shape: {0}")]
    Shape(String),

    #[error(
        "crop {crop_height}x{crop_width} exceeds image dimensions {height}x{width}"
    )]
    SizeExceedsBounds {
        crop_height: usize,
        crop_width: usize,
        height: usize,
        width: usize,
    },

    #[error(
        "crop region at (x={start_x}, y={start_y}) of size {crop_height}x{crop_width} \
         falls outside {height}x{width} image"
    )]
    OutOfBounds {
        start_x: usize,
        start_y: usize,
        crop_height: usize,
        crop_width: usize,
        height: usize,
        width: usize,
    },

    // -- Standardization errors --
    #[error("cannot specify both a dataset preset and an explicit mean/std")]
    ConflictingArguments,

    #[error("must specify either a dataset preset or both mean and std")]
    MissingArguments,

    #[error("image has {actual} channels but mean/std describe {expected}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("unknown dataset preset: {0}")]
    UnknownPreset(String),

    // -- Conversion errors --
    #[error("unsupported input type: {0}")]
    UnsupportedInputType(String),

    #[error("image codec failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error category, for callers that branch on the kind of failure
/// rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSize,
    TypeMismatch,
    InvalidArgument,
    Shape,
    SizeExceedsBounds,
    OutOfBounds,
    ConflictingArguments,
    MissingArguments,
    ChannelMismatch,
    UnknownPreset,
    UnsupportedInputType,
    Image,
    Io,
    Serialization,
}

impl MashError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSize(_) => ErrorKind::InvalidSize,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Shape(_) => ErrorKind::Shape,
            Self::SizeExceedsBounds { .. } => ErrorKind::SizeExceedsBounds,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::ConflictingArguments => ErrorKind::ConflictingArguments,
            Self::MissingArguments => ErrorKind::MissingArguments,
            Self::ChannelMismatch { .. } => ErrorKind::ChannelMismatch,
            Self::UnknownPreset(_) => ErrorKind::UnknownPreset,
            Self::UnsupportedInputType(_) => ErrorKind::UnsupportedInputType,
            Self::ImageError(_) => ErrorKind::Image,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether this error concerns a size, overlap or crop-extent parameter.
    pub fn is_size_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidSize
                | ErrorKind::SizeExceedsBounds
                | ErrorKind::OutOfBounds
                | ErrorKind::TypeMismatch
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MashError>;
