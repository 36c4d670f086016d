// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mash — pixel buffer model, error definitions and configuration shared by
// the transform crates.

pub mod config;
pub mod dims;
pub mod error;
pub mod types;

pub use config::{Preset, TransformConfig};
pub use error::{ErrorKind, MashError, Result};
pub use types::*;
