//! Cache module - read-through caching using Moka.
//!
//! Storage adapters wrap their lookups in a `TypedCache` so repeated reads
//! of the same key don't hit the database.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
