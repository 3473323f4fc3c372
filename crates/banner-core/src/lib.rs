//! Banner Core Library
//!
//! Error types, port traits, the banner cache layer and the read path that
//! decides between cache and storage.

// Re-export pure types from banner-types
pub use banner_types::*;

pub mod cache;
pub mod error;
pub mod ports;
pub mod resolver;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cache::BannerCache;
pub use error::{BannerError, CacheError, CacheResult, Result};
pub use resolver::BannerResolver;
