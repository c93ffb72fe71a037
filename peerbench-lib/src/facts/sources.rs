//! The external services the engine depends on.

use super::{DistributionPoint, TrendSeries};
use crate::Result;
use crate::metrics::{MetricDefinition, Timeframe};
use std::sync::Arc;

/// Supplies the metric definition catalog.
pub trait DefinitionSource: Send + Sync {
    /// Fetch every metric definition.
    fn fetch_definitions(&self) -> impl Future<Output = Result<Vec<MetricDefinition>>> + Send;
}

/// Supplies peer-group distributions and historical trends.
pub trait BenchmarkSource: Send + Sync {
    /// Fetch the five-point distribution of `metric_id` within `peer_group_id`.
    fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> impl Future<Output = Result<DistributionPoint>> + Send;

    /// Fetch the trend of `metric_id` over `timeframe`.
    fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> impl Future<Output = Result<TrendSeries>> + Send;
}

impl<T: DefinitionSource> DefinitionSource for Arc<T> {
    fn fetch_definitions(&self) -> impl Future<Output = Result<Vec<MetricDefinition>>> + Send {
        (**self).fetch_definitions()
    }
}

impl<T: BenchmarkSource> BenchmarkSource for Arc<T> {
    fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> impl Future<Output = Result<DistributionPoint>> + Send {
        (**self).fetch_distribution(metric_id, peer_group_id)
    }

    fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> impl Future<Output = Result<TrendSeries>> + Send {
        (**self).fetch_trend(metric_id, timeframe)
    }
}
