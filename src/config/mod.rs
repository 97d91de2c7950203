//! Configuration types for the ETA SDK.
//!
//! - [`CacheConfig`]: Local caching of API responses

mod cache;

pub use cache::{CacheConfig, DEFAULT_ITEM_PATHS};
