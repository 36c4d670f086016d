// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Validation of untyped numeric dimensions (e.g. values read from JSON) into
// pixel counts.

use crate::error::{MashError, Result};

/// Convert an untyped tile/crop dimension into a pixel count.
///
/// Negative values are size errors; non-finite or fractional values are type
/// mismatches. Zero is rejected unless `allow_zero` is set.
pub fn dimension_from_f64(name: &str, value: f64, allow_zero: bool) -> Result<usize> {
    if value < 0.0 {
        return Err(MashError::InvalidSize(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(MashError::TypeMismatch {
            name: name.to_string(),
            value,
        });
    }
    if value == 0.0 && !allow_zero {
        return Err(MashError::InvalidSize(format!(
            "{name} must be a positive integer, got 0"
        )));
    }
    Ok(value as usize)
}

/// Convert an untyped overlap into a pixel count.
///
/// Overlaps may be zero; negative or fractional overlaps are size errors.
pub fn overlap_from_f64(name: &str, value: f64) -> Result<usize> {
    if value < 0.0 || !value.is_finite() || value.fract() != 0.0 {
        return Err(MashError::InvalidSize(format!(
            "{name} must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as usize)
}
