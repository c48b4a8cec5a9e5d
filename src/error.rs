//! Error types for the explorer core

use thiserror::Error;

/// Errors raised by the dataset, formatting and export layers
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid color format: {0:?} (expected 6 hex digits)")]
    InvalidColorFormat(String),

    #[error("Invalid city record {name:?}: {reason}")]
    InvalidCity { name: String, reason: String },

    #[error("Dataset parse error: {0}")]
    Dataset(#[from] simd_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
