use super::BenchError;
use super::engine::{bounded, check_finite};
use super::percentile::interpolate;
use crate::facts::{BenchmarkSource, CacheStatus, DefinitionSource, DistributionPoint, ExpiringCache};
use crate::metrics::DefinitionRegistry;
use core::time::Duration;
use serde::Serialize;
use std::sync::Arc;

const LOG_TARGET: &str = "comparison";

/// Where a single value falls within its peer group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub metric_id: String,
    pub peer_group_id: String,
    pub value: f64,
    pub percentile: f64,
    pub distribution: DistributionPoint,

    /// Whether the distribution was served from cache.
    pub from_cache: bool,
}

/// Compares single values against cached peer distributions.
#[derive(Debug)]
pub struct ComparisonService<C, B> {
    registry: Arc<DefinitionRegistry<C>>,
    sources: B,
    distributions: ExpiringCache<(String, String), DistributionPoint>,
    distribution_ttl: Duration,
    fetch_timeout: Duration,
}

impl<C, B> ComparisonService<C, B>
where
    C: DefinitionSource,
    B: BenchmarkSource,
{
    #[must_use]
    pub fn new(registry: Arc<DefinitionRegistry<C>>, sources: B, distribution_ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            registry,
            sources,
            distributions: ExpiringCache::new("distributions"),
            distribution_ttl,
            fetch_timeout,
        }
    }

    /// Position of `value` within the distribution of `metric_id` for `peer_group_id`.
    ///
    /// Fetch failures, timeouts and malformed distributions fail the call. Only
    /// well-formed distributions are cached.
    pub async fn compare(&self, value: f64, metric_id: &str, peer_group_id: &str) -> Result<ComparisonResult, BenchError> {
        check_finite(value)?;

        let catalog = self.registry.get_definitions(false).await?;
        if catalog.definition(metric_id).is_none() {
            return Err(BenchError::UnknownMetric(metric_id.to_string()));
        }

        let key = (metric_id.to_string(), peer_group_id.to_string());
        let (distribution, from_cache) = if let Some(distribution) = self.distributions.get(&key) {
            log::debug!(target: LOG_TARGET, "Using cached distribution of '{metric_id}' for '{peer_group_id}'");
            (distribution, true)
        } else {
            log::info!(target: LOG_TARGET, "Fetching distribution of '{metric_id}' for '{peer_group_id}'");

            let distribution = bounded(
                "distribution fetch",
                self.fetch_timeout,
                self.sources.fetch_distribution(metric_id, peer_group_id),
            )
            .await?
            .map_err(|e| {
                log::error!(target: LOG_TARGET, "Could not fetch distribution of '{metric_id}' for '{peer_group_id}': {e:#}");
                BenchError::DistributionFetch {
                    metric_id: metric_id.to_string(),
                    peer_group_id: peer_group_id.to_string(),
                    cause: Arc::new(e),
                }
            })?;

            if let Err(e) = distribution.check_ordering() {
                log::warn!(target: LOG_TARGET, "Rejected distribution of '{metric_id}' for '{peer_group_id}': {e}");
                return Err(e);
            }

            self.distributions.put(key, distribution.clone(), self.distribution_ttl);
            (distribution, false)
        };

        Ok(ComparisonResult {
            metric_id: metric_id.to_string(),
            peer_group_id: peer_group_id.to_string(),
            value,
            percentile: interpolate(value, &distribution.brackets()),
            distribution,
            from_cache,
        })
    }

    #[must_use]
    pub fn cache_status(&self) -> CacheStatus {
        self.distributions.status()
    }

    /// Drop the cached distribution of one metric and peer group.
    pub fn invalidate(&self, metric_id: &str, peer_group_id: &str) -> bool {
        self.distributions.invalidate(&(metric_id.to_string(), peer_group_id.to_string()))
    }

    pub fn start(&self, interval: Duration) {
        self.distributions.start(interval);
    }

    pub fn stop(&self) {
        self.distributions.stop();
    }
}
