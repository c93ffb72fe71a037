use serde::Serialize;
use strum::Display;

/// Which kind of rule produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleLabel {
    Required,
    Numeric,
    Range,
    Min,
    Max,
    Custom,
}

/// A rule that the value failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    pub rule: RuleLabel,
    pub priority: i32,
    pub message: String,
}

/// Which end of a range a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Bound {
    Lower,
    Upper,
}

/// A value that passed a range rule but sits close to one of its bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub bound: Bound,
    pub threshold: f64,
    pub message: String,
}

/// The outcome of validating one value against a metric's rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<RuleViolation>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Error messages in evaluation order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.message.as_str())
    }
}
