//! Adapters for the external catalog and benchmark services.

mod fixture;
mod http;

pub use fixture::FixtureProvider;
pub use http::HttpProvider;

use crate::Result;
use crate::facts::{BenchmarkSource, DefinitionSource, DistributionPoint, TrendSeries};
use crate::metrics::{MetricDefinition, Timeframe};

/// One of the concrete provider adapters.
#[derive(Debug, Clone)]
pub enum Provider {
    Http(HttpProvider),
    Fixture(FixtureProvider),
}

impl DefinitionSource for Provider {
    async fn fetch_definitions(&self) -> Result<Vec<MetricDefinition>> {
        match self {
            Self::Http(p) => p.fetch_definitions().await,
            Self::Fixture(p) => p.fetch_definitions().await,
        }
    }
}

impl BenchmarkSource for Provider {
    async fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> Result<DistributionPoint> {
        match self {
            Self::Http(p) => p.fetch_distribution(metric_id, peer_group_id).await,
            Self::Fixture(p) => p.fetch_distribution(metric_id, peer_group_id).await,
        }
    }

    async fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> Result<TrendSeries> {
        match self {
            Self::Http(p) => p.fetch_trend(metric_id, timeframe).await,
            Self::Fixture(p) => p.fetch_trend(metric_id, timeframe).await,
        }
    }
}
