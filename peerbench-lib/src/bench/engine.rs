//! Batch benchmarking of metric values.
//!
//! A batch runs in three steps. Requests with a live cached result complete
//! immediately. The rest are checked against the catalog and validated; those
//! that fail never reach a provider. The remaining requests are split into chunks
//! of `batch_size` that run as sequential waves: within a wave every request
//! fetches its distribution and trend concurrently, and the wave is awaited as a
//! whole before the next begins.

use super::outcome::{BatchItem, BatchOutcome, BatchProgress, ItemOutcome, ItemState};
use super::percentile::interpolate;
use super::request::{CalculationRequest, CalculationResult, RequestKey};
use super::BenchError;
use crate::expr::{DEFAULT_WARNING_BAND, ValidationContext, ValidationResult, validate_with_band};
use crate::facts::{BenchmarkSource, CacheStatus, DefinitionSource, ExpiringCache, Progress, SilentProgress};
use crate::metrics::DefinitionRegistry;
use core::fmt::{Debug, Formatter};
use core::time::Duration;
use futures_util::future::join_all;
use std::sync::Arc;

const LOG_TARGET: &str = "    engine";

/// Tuning knobs for [`CalculationEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Requests fetched concurrently per wave. Zero is treated as one.
    pub batch_size: usize,

    /// Lifetime of cached calculation results.
    pub result_ttl: Duration,

    /// Upper bound on each individual provider call.
    pub fetch_timeout: Duration,

    /// How often expired cache entries are swept once started.
    pub sweep_interval: Duration,

    /// Fraction of a range's width that counts as near a bound.
    pub warning_band: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            result_ttl: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(60),
            warning_band: DEFAULT_WARNING_BAND,
        }
    }
}

/// Sizes of the caches behind an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCacheStatus {
    pub definitions: CacheStatus,
    pub results: CacheStatus,
    pub validations: CacheStatus,
}

/// Metric id, value bits and context fingerprint of a single validation.
type ValidationKey = (String, Option<u64>, u64);

/// Validates and benchmarks batches of metric values.
pub struct CalculationEngine<C, B> {
    registry: Arc<DefinitionRegistry<C>>,
    sources: B,
    results: ExpiringCache<RequestKey, CalculationResult>,
    validations: ExpiringCache<ValidationKey, ValidationResult>,
    config: EngineConfig,
    progress: Arc<dyn Progress>,
}

impl<C, B> Debug for CalculationEngine<C, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CalculationEngine")
            .field("results", &self.results)
            .field("validations", &self.validations)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C, B> CalculationEngine<C, B>
where
    C: DefinitionSource,
    B: BenchmarkSource,
{
    #[must_use]
    pub fn new(registry: Arc<DefinitionRegistry<C>>, sources: B, config: EngineConfig) -> Self {
        Self {
            registry,
            sources,
            results: ExpiringCache::new("results"),
            validations: ExpiringCache::new("validations"),
            config,
            progress: Arc::new(SilentProgress),
        }
    }

    /// Report batch progress through `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `value` against the rules of `metric_id`.
    ///
    /// Results are memoised for `result_ttl` by metric, value and context fingerprint.
    pub async fn validate(
        &self,
        value: Option<f64>,
        metric_id: &str,
        context: &ValidationContext,
    ) -> Result<ValidationResult, BenchError> {
        if let Some(v) = value {
            check_finite(v)?;
        }

        let key = (metric_id.to_string(), value.map(f64::to_bits), context.fingerprint());
        if let Some(result) = self.validations.get(&key) {
            log::debug!(target: LOG_TARGET, "Reusing validation of '{metric_id}' for context {:016x}", key.2);
            return Ok(result);
        }

        let catalog = self.registry.get_definitions(false).await?;
        let rules = catalog
            .rules_for(metric_id)
            .ok_or_else(|| BenchError::UnknownMetric(metric_id.to_string()))?;

        let result = validate_with_band(value, rules, context, self.config.warning_band);
        self.validations.put(key, result.clone(), self.config.result_ttl);

        Ok(result)
    }

    /// Validate and benchmark every request.
    ///
    /// Items are returned in input order. Per-item failures are recorded on the
    /// item. The call itself fails when the catalog cannot be fetched, or when at
    /// least one request was fetched and every fetched request failed at a provider.
    pub async fn calculate_batch(&self, requests: Vec<CalculationRequest>) -> Result<BatchOutcome, BenchError> {
        let result = self.run_batch(requests).await;
        self.progress.done();
        result
    }

    /// Re-run only the retriable failures of `previous`, keeping every other item as it was.
    pub async fn retry_failed(&self, previous: &BatchOutcome) -> Result<BatchOutcome, BenchError> {
        let positions: Vec<usize> = previous
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.outcome.error().is_some_and(BenchError::is_retriable))
            .map(|(index, _)| index)
            .collect();

        let mut items = previous.items.clone();
        let total = items.len() as u64;

        if positions.is_empty() {
            return Ok(BatchOutcome {
                items,
                progress: BatchProgress {
                    completed: total,
                    total,
                    waves: 0,
                },
            });
        }

        log::info!(target: LOG_TARGET, "Retrying {} failed requests", positions.len());

        let retried = self
            .calculate_batch(positions.iter().map(|&index| items[index].request.clone()).collect())
            .await?;

        let waves = retried.progress.waves;
        for (index, item) in positions.into_iter().zip(retried.items) {
            items[index] = item;
        }

        Ok(BatchOutcome {
            items,
            progress: BatchProgress {
                completed: total,
                total,
                waves,
            },
        })
    }

    #[must_use]
    pub fn cache_status(&self) -> EngineCacheStatus {
        EngineCacheStatus {
            definitions: self.registry.cache_status(),
            results: self.results.status(),
            validations: self.validations.status(),
        }
    }

    /// Drop every cached calculation and validation result.
    pub fn invalidate_results(&self) {
        self.results.clear();
        self.validations.clear();
    }

    /// Start sweeping the definition and result caches every `sweep_interval`.
    pub fn start(&self) {
        self.registry.start(self.config.sweep_interval);
        self.results.start(self.config.sweep_interval);
        self.validations.start(self.config.sweep_interval);
    }

    pub fn stop(&self) {
        self.registry.stop();
        self.results.stop();
        self.validations.stop();
    }

    async fn run_batch(&self, requests: Vec<CalculationRequest>) -> Result<BatchOutcome, BenchError> {
        let total = requests.len() as u64;
        let mut completed = 0_u64;

        self.progress.set_phase("Validating");
        self.progress.start(total);

        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; requests.len()];
        let mut pending = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            if let Err(e) = check_finite(request.value) {
                outcomes[index] = Some(ItemOutcome::Failed(e));
                completed += 1;
                continue;
            }

            if let Some(result) = self.results.get(&request.key()) {
                log::debug!(target: LOG_TARGET, "Request {index} {} -> {}", ItemState::Pending, ItemState::CacheHit);
                outcomes[index] = Some(ItemOutcome::Completed { result, from_cache: true });
                completed += 1;
                continue;
            }

            pending.push(index);
        }

        let mut to_fetch = Vec::with_capacity(pending.len());
        if !pending.is_empty() {
            let catalog = self.registry.get_definitions(false).await?;

            for index in pending {
                let request = &requests[index];
                log::debug!(target: LOG_TARGET, "Request {index} {} -> {}", ItemState::Pending, ItemState::Validating);

                let Some(rules) = catalog.rules_for(&request.metric_id) else {
                    outcomes[index] = Some(ItemOutcome::Failed(BenchError::UnknownMetric(request.metric_id.clone())));
                    completed += 1;
                    continue;
                };

                let validation = validate_with_band(Some(request.value), rules, &ValidationContext::new(), self.config.warning_band);
                if validation.is_valid {
                    to_fetch.push(index);
                } else {
                    log::debug!(target: LOG_TARGET, "Request {index} {} -> {}", ItemState::Validating, ItemState::Invalid);
                    outcomes[index] = Some(ItemOutcome::Invalid(validation));
                    completed += 1;
                }
            }
        }

        let batch_size = self.config.batch_size.max(1);
        let mut waves = 0;

        self.progress.update(completed);
        self.progress.set_phase("Fetching");
        for chunk in to_fetch.chunks(batch_size) {
            waves += 1;
            log::info!(target: LOG_TARGET, "Wave {waves}: fetching {} requests", chunk.len());

            let fetched = join_all(chunk.iter().map(|&index| {
                log::debug!(target: LOG_TARGET, "Request {index} {} -> {}", ItemState::Validating, ItemState::Fetching);
                self.fetch_one(&requests[index])
            }))
            .await;

            for (&index, result) in chunk.iter().zip(fetched) {
                outcomes[index] = Some(match result {
                    Ok(result) => {
                        self.results.put(requests[index].key(), result.clone(), self.config.result_ttl);
                        ItemOutcome::Completed { result, from_cache: false }
                    }
                    Err(e) => {
                        log::error!(target: LOG_TARGET, "Request {index} failed: {e}");
                        ItemOutcome::Failed(e)
                    }
                });
            }

            completed += chunk.len() as u64;
            self.progress.update(completed);
            log::info!(target: LOG_TARGET, "Wave {waves} done, {completed}/{total} requests complete");
        }

        let provider_failures = to_fetch
            .iter()
            .filter(|&&index| {
                outcomes[index]
                    .as_ref()
                    .and_then(ItemOutcome::error)
                    .is_some_and(BenchError::is_provider_failure)
            })
            .count();

        if !to_fetch.is_empty() && provider_failures == to_fetch.len() {
            log::error!(target: LOG_TARGET, "Every one of {provider_failures} fetched requests failed");
            return Err(BenchError::ProvidersUnreachable { failed: provider_failures });
        }

        let items = requests
            .into_iter()
            .zip(outcomes)
            .map(|(request, outcome)| BatchItem {
                request,
                outcome: outcome.unwrap_or_else(|| {
                    ItemOutcome::Failed(BenchError::InvalidInput("request was never processed".to_string()))
                }),
            })
            .collect();

        Ok(BatchOutcome {
            items,
            progress: BatchProgress {
                completed,
                total,
                waves,
            },
        })
    }

    async fn fetch_one(&self, request: &CalculationRequest) -> Result<CalculationResult, BenchError> {
        let after = self.config.fetch_timeout;

        let (distribution, trend) = tokio::join!(
            bounded(
                "distribution fetch",
                after,
                self.sources.fetch_distribution(&request.metric_id, &request.peer_group_id)
            ),
            bounded("trend fetch", after, self.sources.fetch_trend(&request.metric_id, request.timeframe)),
        );

        let distribution = distribution?.map_err(|e| BenchError::DistributionFetch {
            metric_id: request.metric_id.clone(),
            peer_group_id: request.peer_group_id.clone(),
            cause: Arc::new(e),
        })?;

        let trend = trend?.map_err(|e| BenchError::TrendFetch {
            metric_id: request.metric_id.clone(),
            timeframe: request.timeframe,
            cause: Arc::new(e),
        })?;

        if let Err(e) = distribution.check_ordering() {
            log::warn!(
                target: LOG_TARGET,
                "Rejected distribution of '{}' for peer group '{}': {e}",
                request.metric_id,
                request.peer_group_id
            );
            return Err(e);
        }

        let percentile = interpolate(request.value, &distribution.brackets());
        let calculated_value = trend.latest().map(|point| request.value - point.value);
        let median_delta = request.value - distribution.p50;

        Ok(CalculationResult {
            metric_id: request.metric_id.clone(),
            value: request.value,
            peer_group_id: request.peer_group_id.clone(),
            timeframe: request.timeframe,
            percentile,
            distribution,
            trend,
            calculated_value,
            median_delta,
        })
    }
}

/// Run `fut`, failing with [`BenchError::Timeout`] if it takes longer than `after`.
pub(super) async fn bounded<T>(operation: &str, after: Duration, fut: impl Future<Output = T>) -> Result<T, BenchError> {
    tokio::time::timeout(after, fut).await.map_err(|_elapsed| {
        log::error!(target: LOG_TARGET, "{operation} timed out after {}ms", after.as_millis());
        BenchError::Timeout {
            operation: operation.to_string(),
            after,
        }
    })
}

pub(super) fn check_finite(value: f64) -> Result<(), BenchError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BenchError::InvalidInput(format!("value '{value}' is not a finite number")))
    }
}
