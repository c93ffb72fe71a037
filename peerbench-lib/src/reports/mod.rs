//! Rendering of validation, comparison, and batch results.
//!
//! Two generators are provided, each with one function per result kind:
//! - **Console**: aligned terminal output with optional ANSI colors
//! - **JSON**: machine-readable structured data
//!
//! Both write into any `core::fmt::Write`, so callers can render into a
//! `String` and hand the text to a `Host`. Value and status formatting is
//! shared in the `common` module.

mod common;
pub mod console;
pub mod json;
