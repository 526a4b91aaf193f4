//! Infrastructure token store implementations.
//!
//! The `TokenStore` contract and the in-memory store live in `campus-auth`.
//! This module provides cache-backed implementations (e.g. Redis).

#[cfg(feature = "redis")]
pub mod redis_store;

#[cfg(feature = "redis")]
pub use redis_store::RedisTokenStore;
