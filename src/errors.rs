//! Error types for CESR cryptographic material handling

use thiserror::Error;

/// Errors raised while composing or parsing CESR material
#[derive(Error, Debug)]
pub enum MatterError {
    #[error("Empty material.")]
    EmptyMaterial,

    #[error("Invalid code = {0}.")]
    InvalidCode(String),

    #[error("Invalid code size: {0}")]
    InvalidCodeSize(String),

    #[error("Invalid raw size: {0}")]
    InvalidRawSize(String),

    #[error("Invalid var index: {0}")]
    InvalidVarIndex(String),

    #[error("Shortage error: {0}")]
    ShortageError(String),

    #[error("Unexpected code: {0}")]
    UnexpectedCode(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Value error: {0}")]
    ValueError(String),
}
