use crate::facts::{DistributionPoint, TrendSeries};
use crate::metrics::Timeframe;
use serde::{Deserialize, Serialize};

/// A request to benchmark one metric value against one peer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub metric_id: String,
    pub value: f64,
    pub peer_group_id: String,
    pub timeframe: Timeframe,
}

impl CalculationRequest {
    #[must_use]
    pub fn new(metric_id: impl Into<String>, value: f64, peer_group_id: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            metric_id: metric_id.into(),
            value,
            peer_group_id: peer_group_id.into(),
            timeframe,
        }
    }

    pub(crate) fn key(&self) -> RequestKey {
        RequestKey {
            metric_id: self.metric_id.clone(),
            value_bits: self.value.to_bits(),
            peer_group_id: self.peer_group_id.clone(),
            timeframe: self.timeframe,
        }
    }
}

/// Result cache key covering every request field, with the value keyed by its exact bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RequestKey {
    metric_id: String,
    value_bits: u64,
    peer_group_id: String,
    timeframe: Timeframe,
}

/// A benchmarked metric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub metric_id: String,
    pub value: f64,
    pub peer_group_id: String,
    pub timeframe: Timeframe,

    /// Position of the value within the peer distribution, 0-100.
    pub percentile: f64,

    pub distribution: DistributionPoint,
    pub trend: TrendSeries,

    /// The value relative to the most recent trend point.
    pub calculated_value: Option<f64>,

    /// The value relative to the peer median.
    pub median_delta: f64,
}
