//! Rule validation for metric values
//!
//! Custom rules may carry a CEL (Common Expression Language) predicate. Each
//! predicate is compiled once when the catalog is loaded and evaluated with two
//! variables in scope: `value`, the metric value as a float, and `context`, a map
//! of caller-supplied flags, numbers and strings.
//!
//! The [`validate`] function is the entry point. It evaluates a metric's rules in
//! priority order and returns a [`ValidationResult`] carrying structured errors and
//! near-bound warnings.

mod context;
mod expression;
mod validation_outcome;
mod validator;

pub use context::{ContextValue, ValidationContext};
pub use expression::Expression;
pub use validation_outcome::{Bound, RuleLabel, RuleViolation, ValidationResult, ValidationWarning};
pub use validator::{DEFAULT_WARNING_BAND, validate, validate_with_band};
