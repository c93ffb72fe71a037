use crate::Result;
use crate::expr::{Expression, ValidationContext};
use core::fmt::{Debug, Formatter};
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

type NativePredicate = dyn Fn(f64, &ValidationContext) -> bool + Send + Sync;

/// The test performed by a custom rule.
#[derive(Clone)]
pub enum Predicate {
    /// A CEL expression, as shipped in catalogs.
    Expression(Expression),

    /// A closure supplied in code. Cannot be serialized.
    Native(Arc<NativePredicate>),
}

impl Predicate {
    /// Compile a CEL predicate.
    pub fn expression(source: impl Into<String>) -> Result<Self> {
        Expression::new(source).map(Self::Expression)
    }

    pub fn native(f: impl Fn(f64, &ValidationContext) -> bool + Send + Sync + 'static) -> Self {
        Self::Native(Arc::new(f))
    }
}

impl Debug for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Expression(expr) => f.debug_tuple("Expression").field(&expr.source()).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Expression(expr) => expr.serialize(serializer),
            Self::Native(_) => Err(S::Error::custom("native predicates cannot be serialized")),
        }
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Expression::deserialize(deserializer).map(Self::Expression)
    }
}

/// What a rule checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Inclusive on both ends.
    Range { min: f64, max: f64 },
    Min { min: f64 },
    Max { max: f64 },
    Custom { predicate: Predicate },
}

/// One domain rule attached to a metric definition.
///
/// Rules are evaluated in descending `priority`. A failing rule with a positive
/// priority halts evaluation of the remaining rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(flatten)]
    pub kind: RuleKind,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub required: bool,

    pub message: String,
}

impl ValidationRule {
    #[must_use]
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            priority: 0,
            required: false,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn range(min: f64, max: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Range { min, max }, message)
    }

    #[must_use]
    pub fn min(min: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Min { min }, message)
    }

    #[must_use]
    pub fn max(max: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Max { max }, message)
    }

    #[must_use]
    pub fn custom(predicate: Predicate, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Custom { predicate }, message)
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns whether a failure of this rule stops evaluation.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.priority > 0
    }
}
