//! Error types for range-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("No grains available: {0}")]
    NoGrainsAvailable(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, RangeError>;
