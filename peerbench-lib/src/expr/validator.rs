//! Priority-ordered rule evaluation.
//!
//! Rules are evaluated highest priority first, with ties kept in catalog order.
//! A failing rule whose priority is positive is critical and stops evaluation;
//! other failures are recorded and evaluation continues. Range rules the value
//! satisfies additionally produce a warning when the value sits inside the
//! warning band next to either bound.

use super::{Bound, RuleLabel, RuleViolation, ValidationContext, ValidationResult, ValidationWarning};
use crate::metrics::{Predicate, RuleKind, ValidationRule};

const LOG_TARGET: &str = " validator";

/// Fraction of a range's width treated as "near" a bound.
pub const DEFAULT_WARNING_BAND: f64 = 0.1;

/// Validate `value` against `rules` using the default warning band.
#[must_use]
pub fn validate(value: Option<f64>, rules: &[ValidationRule], context: &ValidationContext) -> ValidationResult {
    validate_with_band(value, rules, context, DEFAULT_WARNING_BAND)
}

/// Validate `value` against `rules`.
///
/// `warning_band` is the fraction of each range's width, measured from either
/// bound, inside which a passing value is flagged with a warning.
#[must_use]
pub fn validate_with_band(
    value: Option<f64>,
    rules: &[ValidationRule],
    context: &ValidationContext,
    warning_band: f64,
) -> ValidationResult {
    let Some(value) = value else {
        return match rules.iter().filter(|rule| rule.required).map(|rule| rule.priority).max() {
            Some(priority) => ValidationResult {
                is_valid: false,
                errors: vec![RuleViolation {
                    rule: RuleLabel::Required,
                    priority,
                    message: "A value is required".to_string(),
                }],
                warnings: Vec::new(),
            },
            None => ValidationResult::valid(),
        };
    };

    if !value.is_finite() {
        return ValidationResult {
            is_valid: false,
            errors: vec![RuleViolation {
                rule: RuleLabel::Numeric,
                priority: i32::MAX,
                message: format!("Value '{value}' is not a finite number"),
            }],
            warnings: Vec::new(),
        };
    }

    let mut ordered: Vec<&ValidationRule> = rules.iter().collect();
    ordered.sort_by_key(|rule| core::cmp::Reverse(rule.priority));

    let mut errors = Vec::new();
    for rule in &ordered {
        if passes(rule, value, context) {
            continue;
        }

        errors.push(RuleViolation {
            rule: label(&rule.kind),
            priority: rule.priority,
            message: rule.message.clone(),
        });

        if rule.is_critical() {
            break;
        }
    }

    let warnings = ordered
        .iter()
        .filter_map(|rule| match rule.kind {
            RuleKind::Range { min, max } => Some((min, max)),
            _ => None,
        })
        .flat_map(|(min, max)| near_bounds(value, min, max, warning_band))
        .collect();

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn passes(rule: &ValidationRule, value: f64, context: &ValidationContext) -> bool {
    match &rule.kind {
        RuleKind::Range { min, max } => value >= *min && value <= *max,
        RuleKind::Min { min } => value >= *min,
        RuleKind::Max { max } => value <= *max,
        RuleKind::Custom { predicate } => match predicate {
            Predicate::Native(f) => f(value, context),
            Predicate::Expression(expr) => expr.evaluate(value, context).unwrap_or_else(|e| {
                log::warn!(target: LOG_TARGET, "Treating predicate '{}' as failed: {e:#}", expr.source());
                false
            }),
        },
    }
}

const fn label(kind: &RuleKind) -> RuleLabel {
    match kind {
        RuleKind::Range { .. } => RuleLabel::Range,
        RuleKind::Min { .. } => RuleLabel::Min,
        RuleKind::Max { .. } => RuleLabel::Max,
        RuleKind::Custom { .. } => RuleLabel::Custom,
    }
}

/// A value is near a bound when it lies within `band` of the range width from it.
fn near_bounds(value: f64, min: f64, max: f64, band: f64) -> Vec<ValidationWarning> {
    let width = max - min;
    if width <= 0.0 || value < min || value > max {
        return Vec::new();
    }

    let margin = width * band;
    let mut warnings = Vec::new();

    if value - min <= margin {
        warnings.push(ValidationWarning {
            bound: Bound::Lower,
            threshold: min,
            message: format!("Value {value} is near lower threshold {min}"),
        });
    }

    if max - value <= margin {
        warnings.push(ValidationWarning {
            bound: Bound::Upper,
            threshold: max,
            message: format!("Value {value} is near upper threshold {max}"),
        });
    }

    warnings
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::expr::ContextValue;

    fn ctx() -> ValidationContext {
        ValidationContext::new()
    }

    #[test]
    fn range_accepts_inclusive_bounds() {
        let rules = [ValidationRule::range(0.0, 100.0, "out of range")];
        for v in [0.0, 0.5, 50.0, 99.9, 100.0] {
            assert!(validate(Some(v), &rules, &ctx()).is_valid, "{v} should be valid");
        }
    }

    #[test]
    fn range_rejects_outside_with_message() {
        let rules = [ValidationRule::range(0.0, 140.0, "Retention must be between 0 and 140")];
        let result = validate(Some(150.0), &rules, &ctx());

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule, RuleLabel::Range);
        assert_eq!(result.errors[0].message, "Retention must be between 0 and 140");
        assert!(result.warnings.is_empty());

        assert!(!validate(Some(-0.1), &rules, &ctx()).is_valid);
    }

    #[test]
    fn min_and_max() {
        let rules = [ValidationRule::min(1.0, "too small"), ValidationRule::max(10.0, "too big")];
        assert!(validate(Some(5.0), &rules, &ctx()).is_valid);

        let low = validate(Some(0.0), &rules, &ctx());
        assert_eq!(low.messages().collect::<Vec<_>>(), ["too small"]);

        let high = validate(Some(11.0), &rules, &ctx());
        assert_eq!(high.messages().collect::<Vec<_>>(), ["too big"]);
    }

    #[test]
    fn critical_failure_stops_evaluation() {
        let rules = [
            ValidationRule::custom(Predicate::native(|_, _| false), "custom failed").with_priority(1),
            ValidationRule::range(0.0, 100.0, "Value out of range").with_priority(2),
        ];

        let result = validate(Some(150.0), &rules, &ctx());
        assert!(!result.is_valid);
        assert_eq!(result.messages().collect::<Vec<_>>(), ["Value out of range"]);
    }

    #[test]
    fn non_critical_failures_accumulate_in_priority_order() {
        let rules = [
            ValidationRule::max(10.0, "low priority").with_priority(-1),
            ValidationRule::min(100.0, "zero priority"),
            ValidationRule::custom(Predicate::native(|_, _| false), "also zero"),
        ];

        let result = validate(Some(50.0), &rules, &ctx());
        assert_eq!(result.messages().collect::<Vec<_>>(), ["zero priority", "also zero", "low priority"]);
    }

    #[test]
    fn equal_priority_critical_rules_halt_on_first_failure() {
        let rules = [
            ValidationRule::max(10.0, "first").with_priority(5),
            ValidationRule::max(20.0, "second").with_priority(5),
        ];

        let result = validate(Some(50.0), &rules, &ctx());
        assert_eq!(result.messages().collect::<Vec<_>>(), ["first"]);
    }

    #[test]
    fn missing_value_with_required_rule() {
        let rules = [
            ValidationRule::range(0.0, 100.0, "range").required().with_priority(3),
            ValidationRule::min(0.0, "min"),
        ];

        let result = validate(None, &rules, &ctx());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule, RuleLabel::Required);
        assert_eq!(result.errors[0].priority, 3);
    }

    #[test]
    fn missing_value_without_required_rule_is_valid() {
        let rules = [ValidationRule::min(0.0, "min")];
        let result = validate(None, &rules, &ctx());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn non_finite_value_is_rejected() {
        let rules = [ValidationRule::min(0.0, "min")];
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = validate(Some(v), &rules, &ctx());
            assert!(!result.is_valid);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.errors[0].rule, RuleLabel::Numeric);
        }
    }

    #[test]
    fn near_upper_threshold_warning() {
        let rules = [ValidationRule::range(0.0, 200.0, "range")];
        let result = validate(Some(190.0), &rules, &ctx());

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].bound, Bound::Upper);
        assert!(result.warnings[0].message.contains("near upper threshold"));
    }

    #[test]
    fn near_lower_threshold_warning() {
        let rules = [ValidationRule::range(0.0, 200.0, "range")];
        let result = validate(Some(15.0), &rules, &ctx());

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].bound, Bound::Lower);
        assert!(result.warnings[0].message.contains("near lower threshold"));
    }

    #[test]
    fn middle_of_range_has_no_warning() {
        let rules = [ValidationRule::range(0.0, 200.0, "range")];
        assert!(validate(Some(150.0), &rules, &ctx()).warnings.is_empty());
    }

    #[test]
    fn warnings_do_not_depend_on_other_failures() {
        let rules = [
            ValidationRule::range(0.0, 200.0, "range"),
            ValidationRule::max(100.0, "max exceeded"),
        ];
        let result = validate(Some(195.0), &rules, &ctx());

        assert!(!result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn custom_band_width() {
        let rules = [ValidationRule::range(0.0, 100.0, "range")];
        assert!(validate_with_band(Some(75.0), &rules, &ctx(), 0.1).warnings.is_empty());
        assert_eq!(validate_with_band(Some(75.0), &rules, &ctx(), 0.3).warnings.len(), 1);
        assert!(validate_with_band(Some(99.0), &rules, &ctx(), 0.0).warnings.is_empty());
    }

    #[test]
    fn degenerate_range_has_no_warnings() {
        let rules = [ValidationRule::range(5.0, 5.0, "exact")];
        let result = validate(Some(5.0), &rules, &ctx());
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn expression_predicate_sees_context() {
        let rules = [ValidationRule::custom(Predicate::expression("value <= context.cap").unwrap(), "over cap")];
        let context = ValidationContext::new().with("cap", ContextValue::Number(30.0));

        assert!(validate(Some(30.0), &rules, &context).is_valid);
        assert!(!validate(Some(31.0), &rules, &context).is_valid);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn failing_expression_counts_as_failed_rule() {
        let rules = [ValidationRule::custom(Predicate::expression("value <= context.missing").unwrap(), "broken")];
        let result = validate(Some(1.0), &rules, &ctx());
        assert_eq!(result.messages().collect::<Vec<_>>(), ["broken"]);
    }
}
