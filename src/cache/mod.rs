//! Elvis representation cache
//!
//! Holds MIN, LIST and EMB representations keyed by `{TIER}-{uuid}`. FULL
//! representations are never stored.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 10000
//! warm_on_startup = false
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::{CACHED_TIERS, CacheKey};
pub use store::{MemoryCache, NoopCache, RepresentationCache, build_cache};
