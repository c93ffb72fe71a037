use crate::bench::{BenchError, Bracket};
use crate::metrics::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five-point peer distribution of one metric within one peer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPoint {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,

    /// Where the numbers came from, e.g. a survey or dataset name.
    #[serde(default)]
    pub source: String,

    pub collected_at: DateTime<Utc>,
}

impl DistributionPoint {
    /// The brackets in ascending percentile order.
    #[must_use]
    pub const fn brackets(&self) -> [Bracket; 5] {
        [
            Bracket::new(10.0, self.p10),
            Bracket::new(25.0, self.p25),
            Bracket::new(50.0, self.p50),
            Bracket::new(75.0, self.p75),
            Bracket::new(90.0, self.p90),
        ]
    }

    /// Check that every bracket is finite and the values never decrease.
    ///
    /// Offending distributions are rejected rather than corrected.
    pub fn check_ordering(&self) -> Result<(), BenchError> {
        let brackets = self.brackets();

        if let Some(b) = brackets.iter().find(|b| !b.value.is_finite()) {
            return Err(BenchError::InvalidDistribution(format!(
                "p{} is not a finite number ({})",
                b.percentile, b.value
            )));
        }

        for pair in brackets.windows(2) {
            if pair[1].value < pair[0].value {
                return Err(BenchError::InvalidDistribution(format!(
                    "p{} ({}) is below p{} ({})",
                    pair[1].percentile, pair[1].value, pair[0].percentile, pair[0].value
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Period label, e.g. `2024-Q3`.
    pub period: String,
    pub value: f64,
}

/// Historical values of one metric, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric_id: String,
    pub timeframe: Timeframe,

    #[serde(default)]
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    #[must_use]
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    /// Last value minus first value, if the series has at least two points.
    #[must_use]
    pub fn change(&self) -> Option<f64> {
        match self.points.as_slice() {
            [first, .., last] => Some(last.value - first.value),
            _ => None,
        }
    }
}
