//! Data the engine consumes and the in-memory caches that hold it
//!
//! The engine never talks to a network service directly. It consumes the
//! [`DefinitionSource`] and [`BenchmarkSource`] traits, implemented here by an
//! HTTP adapter for a live benchmark service and a fixture adapter that reads a
//! single JSON document from disk.
//!
//! Everything fetched is held in an [`ExpiringCache`], a key/value store with a
//! per-entry TTL and an optional periodic sweep. Each cache belongs to exactly
//! one component; other components only see derived accessors such as
//! [`CacheStatus`].

mod cache;
mod distribution;
mod progress;
pub mod providers;
mod sources;

pub use cache::{CacheStatus, ExpiringCache};
pub use distribution::{DistributionPoint, TrendPoint, TrendSeries};
pub use progress::{Progress, SilentProgress};
pub use sources::{BenchmarkSource, DefinitionSource};
