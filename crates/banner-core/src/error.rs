//! Error types for the banner service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BannerError>;

/// Errors returned by the source of record
#[derive(Error, Debug)]
pub enum BannerError {
    #[error("no banner found")]
    RecordAbsent,

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache failures. The read path treats every variant as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
