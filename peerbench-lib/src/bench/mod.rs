//! Percentile benchmarking of metric values
//!
//! This module holds the caller-facing engine. [`CalculationEngine`] validates
//! and benchmarks batches of [`CalculationRequest`]s in sequential waves of
//! concurrent provider calls, caching each [`CalculationResult`].
//! [`ComparisonService`] answers the single-value question of where a value
//! falls within one peer group.
//!
//! Both place a value within a five-point peer distribution using
//! [`interpolate`], a piecewise-linear interpolation between the p10, p25, p50,
//! p75 and p90 brackets.

mod comparison;
mod engine;
mod error;
mod outcome;
mod percentile;
mod request;

pub use comparison::{ComparisonResult, ComparisonService};
pub use engine::{CalculationEngine, EngineCacheStatus, EngineConfig};
pub use error::{BenchError, ItemError};
pub use outcome::{BatchItem, BatchOutcome, BatchProgress, ItemOutcome, ItemState};
pub use percentile::{Bracket, interpolate};
pub use request::{CalculationRequest, CalculationResult};
