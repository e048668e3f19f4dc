//! Session caches for external query results

pub mod inflight_cache;

// Re-export the main cache type
pub use inflight_cache::InFlightCache;
