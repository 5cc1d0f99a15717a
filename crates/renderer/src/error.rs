//! Rendering errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("invalid stretch range: min {min} must be below max {max}")]
    InvalidRange { min: f32, max: f32 },

    #[error("image of {width}x{height} does not match {len} values")]
    SizeMismatch { width: usize, height: usize, len: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
