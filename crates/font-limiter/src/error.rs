use std::result;

use read_fonts::ReadError;

/// Error types for font-limiter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse font: {0}")]
    Parse(#[from] ReadError),

    #[error("not a variable font (no fvar table)")]
    NotVariableFont,

    #[error("axis not found: {0}")]
    AxisNotFound(String),

    #[error("invalid axis limit {min}:{default}:{max} (need -1 <= min <= default <= max <= 1)")]
    InvalidAxisLimit { min: f64, default: f64, max: f64 },

    #[error("invalid axis value {value} for {tag} (range: {min}..{max})")]
    InvalidAxisValue { tag: String, value: f64, min: f64, max: f64 },

    #[error("expected TAG=VALUE, TAG=MIN:MAX or TAG=MIN:DEFAULT:MAX: {0}")]
    InvalidLimitSpec(String),
}

pub type Result<T> = result::Result<T, Error>;
