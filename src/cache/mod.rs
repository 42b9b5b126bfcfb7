//! Listing cache.
//!
//! - `swr`: the stale-while-revalidate cache over a `Lister`

pub mod swr;

pub use swr::{CacheKey, SwrCache};
