//! Boolean CEL expressions used as custom validation predicates

use super::{ContextValue, ValidationContext};
use crate::Result;
use cel_interpreter::{Context, Program, Value, objects::Map};
use ohno::{IntoAppError, app_err};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::panic;
use std::sync::Arc;

/// A compiled boolean expression over `value` and `context`.
///
/// The metric value is bound to `value` and the caller's context map to `context`,
/// so an expression looks like `value <= context.cap || context.trial == true`.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    program: Arc<Program>,
}

impl Expression {
    /// Compile an expression string
    ///
    /// Expressions arrive with provider catalogs, so a parser panic on malformed
    /// input is reported as a parse error.
    ///
    /// # Errors
    /// Returns an error if the expression cannot be parsed
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let program = match panic::catch_unwind(|| Program::compile(&source)) {
            Ok(Ok(program)) => program,
            Ok(Err(e)) => return Err(app_err!("Could not parse expression '{source}': {e}")),
            Err(_) => return Err(app_err!("Could not parse expression '{source}': malformed input")),
        };

        Ok(Self {
            source,
            program: Arc::new(program),
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a metric value and caller context
    ///
    /// # Errors
    /// Returns an error if execution fails or the expression does not produce a boolean
    pub fn evaluate(&self, value: f64, context: &ValidationContext) -> Result<bool> {
        let cel_context = build_cel_context(value, context);

        match self
            .program
            .execute(&cel_context)
            .into_app_err_with(|| format!("Could not evaluate expression '{}'", self.source))?
        {
            Value::Bool(b) => Ok(b),
            other => Err(app_err!("Expression '{}' did not return a boolean, got '{other:?}' instead", self.source)),
        }
    }
}

fn build_cel_context(value: f64, context: &ValidationContext) -> Context<'_> {
    let mut cel_context = Context::default();

    let fields: HashMap<Arc<String>, Value> = context
        .iter()
        .map(|(name, value)| (Arc::new(name.to_string()), convert_context_value(value)))
        .collect();

    cel_context.add_variable_from_value("value", Value::Float(value));
    cel_context.add_variable_from_value("context", Value::Map(Map::from(fields)));

    cel_context
}

fn convert_context_value(value: &ContextValue) -> Value {
    match value {
        ContextValue::Flag(b) => Value::Bool(*b),
        ContextValue::Number(n) => Value::Float(*n),
        ContextValue::Text(s) => Value::String(Arc::new(s.clone())),
    }
}

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::new(source).map_err(D::Error::custom)
    }
}
