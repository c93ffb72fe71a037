use super::{MetricCategory, MetricUnit, Timeframe, ValidationRule};
use serde::{Deserialize, Serialize};

/// A catalog entry describing one business metric and the rules its values must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    pub name: String,
    pub category: MetricCategory,
    pub unit: MetricUnit,
    pub timeframe: Timeframe,

    #[serde(default)]
    pub formula: String,

    #[serde(default)]
    pub rules: Vec<ValidationRule>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn deserialize_catalog_entry() {
        let def: MetricDefinition = serde_json::from_str(
            r#"{
                "id": "net_revenue_retention",
                "name": "Net Revenue Retention",
                "category": "retention",
                "unit": "percentage",
                "timeframe": "annual",
                "formula": "(starting_mrr + expansion - churn) / starting_mrr",
                "rules": [{"kind": "range", "min": 0, "max": 200, "priority": 1, "message": "NRR must be 0-200%"}]
            }"#,
        )
        .unwrap();

        assert_eq!(def.id, "net_revenue_retention");
        assert_eq!(def.category, MetricCategory::Retention);
        assert_eq!(def.unit, MetricUnit::Percentage);
        assert_eq!(def.timeframe, Timeframe::Annual);
        assert_eq!(def.rules.len(), 1);
    }

    #[test]
    fn formula_and_rules_are_optional() {
        let def: MetricDefinition = serde_json::from_str(
            r#"{"id": "cac_payback", "name": "CAC Payback", "category": "efficiency", "unit": "months", "timeframe": "monthly"}"#,
        )
        .unwrap();

        assert!(def.formula.is_empty());
        assert!(def.rules.is_empty());
    }
}
