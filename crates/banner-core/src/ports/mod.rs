//! Port traits (interfaces) for dependency injection

pub mod cache;
pub mod events;
pub mod storage;

pub use cache::CacheBackend;
pub use events::{CacheEventSink, TracingEventSink};
pub use storage::BannerStore;
