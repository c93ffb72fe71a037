//! Metric definitions and the catalog they are served from
//!
//! A [`MetricDefinition`] describes one business metric: its category, unit,
//! reporting timeframe, formula text and the [`ValidationRule`]s its values
//! must satisfy. Definitions come from an external catalog service and are
//! immutable once fetched.
//!
//! The [`DefinitionRegistry`] fetches the whole catalog on demand, builds a
//! [`Catalog`] indexing each metric's rules in descending priority, and caches
//! it for a fixed time. A refresh replaces the catalog wholesale.

mod definition;
mod metric_category;
mod metric_unit;
mod registry;
mod timeframe;
mod validation_rule;

pub use definition::MetricDefinition;
pub use metric_category::MetricCategory;
pub use metric_unit::MetricUnit;
pub use registry::{Catalog, DefinitionRegistry};
pub use timeframe::Timeframe;
pub use validation_rule::{Predicate, RuleKind, ValidationRule};
