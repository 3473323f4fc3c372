//! Storage layer
//!
//! PostgreSQL is the source of record. Redis caches banner lookups, with an
//! in-process DashMap cache as the fallback when no Redis host is configured.

pub mod db;
pub mod memory;
pub mod redis;

pub use db::Database;
pub use memory::MemoryCache;
pub use self::redis::RedisCache;
