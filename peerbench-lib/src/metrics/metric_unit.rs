use serde::{Deserialize, Serialize};
use strum::Display;

/// Unit a metric value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Percentage,
    Currency,
    Ratio,
    Months,
}

impl MetricUnit {
    /// Render a value with this unit's conventional suffix or prefix.
    #[must_use]
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Percentage => format!("{value:.1}%"),
            Self::Currency => format!("${value:.2}"),
            Self::Ratio => format!("{value:.2}x"),
            Self::Months => format!("{value:.1} months"),
        }
    }
}
