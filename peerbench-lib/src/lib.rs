#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for peerbench
//!
//! This library consolidates all functionality for the peerbench tool, which
//! validates business metric values against a catalog of rules and ranks them
//! within peer-group distributions.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`bench`]: Percentile interpolation, batch calculation, and comparisons
//! - [`expr`]: CEL predicates and rule evaluation
//! - [`facts`]: Provider traits and adapters, distributions, and the expiring cache
//! - [`metrics`]: Metric definitions, validation rules, and the definition registry
//! - [`reports`]: Console and JSON output

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod bench;
#[cfg(not(any(debug_assertions, test)))]
mod bench;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

#[cfg(any(debug_assertions, test))]
pub mod expr;
#[cfg(not(any(debug_assertions, test)))]
mod expr;

#[cfg(any(debug_assertions, test))]
pub mod facts;
#[cfg(not(any(debug_assertions, test)))]
mod facts;

#[cfg(any(debug_assertions, test))]
pub mod metrics;
#[cfg(not(any(debug_assertions, test)))]
mod metrics;

#[cfg(any(debug_assertions, test))]
pub mod reports;
#[cfg(not(any(debug_assertions, test)))]
mod reports;

pub use crate::commands::{Host, run};
