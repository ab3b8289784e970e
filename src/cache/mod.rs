//! Offline cache for fetched listings.
//!
//! Hosts write listings through after a successful fetch and read them
//! back on startup to render something while the next fetch runs. The
//! cache is display fodder only; it never feeds requests.

pub mod manager;

pub use manager::{CacheManager, CachedData};
