//! End-to-end behavior of the calculation engine and the comparison service
//! against in-memory sources.

use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::app_err;
use peerbench_lib::Result;
use peerbench_lib::bench::{
    BenchError, CalculationEngine, CalculationRequest, ComparisonService, EngineConfig, ItemOutcome, ItemState,
};
use peerbench_lib::expr::{ContextValue, ValidationContext};
use peerbench_lib::facts::{BenchmarkSource, DefinitionSource, DistributionPoint, TrendPoint, TrendSeries};
use peerbench_lib::metrics::{
    DefinitionRegistry, MetricCategory, MetricDefinition, MetricUnit, Predicate, Timeframe, ValidationRule,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn distribution(values: [f64; 5]) -> DistributionPoint {
    DistributionPoint {
        p10: values[0],
        p25: values[1],
        p50: values[2],
        p75: values[3],
        p90: values[4],
        source: "test survey".into(),
        collected_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn metric(id: &str, rules: Vec<ValidationRule>) -> MetricDefinition {
    MetricDefinition {
        id: id.to_string(),
        name: id.to_uppercase(),
        category: MetricCategory::Retention,
        unit: MetricUnit::Percentage,
        timeframe: Timeframe::Annual,
        formula: String::new(),
        rules,
    }
}

/// In-memory catalog and benchmark service with failure and latency injection.
#[derive(Default)]
struct Bench {
    definitions: Vec<MetricDefinition>,
    distributions: HashMap<String, DistributionPoint>,

    /// Peer groups whose distribution fetch fails this many more times.
    failures: Mutex<HashMap<String, usize>>,

    /// Peer groups whose distribution fetch takes this long.
    latency: HashMap<String, Duration>,

    distribution_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Bench {
    fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self {
            definitions,
            ..Self::default()
        }
    }

    fn with_distribution(mut self, peer_group: &str, point: DistributionPoint) -> Self {
        let _ = self.distributions.insert(peer_group.to_string(), point);
        self
    }

    fn failing(self, peer_group: &str, times: usize) -> Self {
        let _ = self.failures.lock().unwrap().insert(peer_group.to_string(), times);
        self
    }

    fn slow(mut self, peer_group: &str, latency: Duration) -> Self {
        let _ = self.latency.insert(peer_group.to_string(), latency);
        self
    }

    fn calls(&self) -> usize {
        self.distribution_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self, peer_group: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(peer_group) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl DefinitionSource for Bench {
    async fn fetch_definitions(&self) -> Result<Vec<MetricDefinition>> {
        Ok(self.definitions.clone())
    }
}

impl BenchmarkSource for Bench {
    async fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> Result<DistributionPoint> {
        let _ = self.distribution_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self.latency.get(peer_group_id).copied().unwrap_or(Duration::from_millis(5));
        tokio::time::sleep(latency).await;

        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.take_failure(peer_group_id) {
            return Err(app_err!("benchmark service rejected '{metric_id}' for '{peer_group_id}'"));
        }

        self.distributions
            .get(peer_group_id)
            .cloned()
            .ok_or_else(|| app_err!("no distribution for '{peer_group_id}'"))
    }

    async fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> Result<TrendSeries> {
        Ok(TrendSeries {
            metric_id: metric_id.to_string(),
            timeframe,
            points: vec![
                TrendPoint {
                    period: "2023".into(),
                    value: 100.0,
                },
                TrendPoint {
                    period: "2024".into(),
                    value: 110.0,
                },
            ],
        })
    }
}

fn nrr_bench() -> Bench {
    Bench::new(vec![metric("nrr", vec![ValidationRule::range(0.0, 200.0, "NRR must be 0-200%").with_priority(1)])])
        .with_distribution("saas-smb", distribution([60.0, 80.0, 100.0, 120.0, 140.0]))
        .with_distribution("saas-mid", distribution([70.0, 90.0, 105.0, 115.0, 130.0]))
}

fn engine(bench: &Arc<Bench>, config: EngineConfig) -> CalculationEngine<Arc<Bench>, Arc<Bench>> {
    let registry = Arc::new(DefinitionRegistry::new(Arc::clone(bench), Duration::from_secs(600)));
    CalculationEngine::new(registry, Arc::clone(bench), config)
}

fn request(value: f64, peer_group: &str) -> CalculationRequest {
    CalculationRequest::new("nrr", value, peer_group, Timeframe::Annual)
}

#[tokio::test(start_paused = true)]
async fn test_single_request_interpolates_between_brackets() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(&bench, EngineConfig::default());

    let outcome = engine.calculate_batch(vec![request(130.0, "saas-smb")]).await.unwrap();
    let result = outcome.items[0].outcome.result().unwrap();

    assert!((result.percentile - 82.5).abs() < 1e-9);
    assert_eq!(result.calculated_value, Some(20.0));
    assert!((result.median_delta - 30.0).abs() < 1e-9);
    assert_eq!(outcome.progress.completed, 1);
    assert!(outcome.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_higher_priority_failure_short_circuits() {
    let always_false = ValidationRule::custom(Predicate::native(|_, _| false), "custom rule always fails").with_priority(1);
    let bench = Arc::new(Bench::new(vec![metric(
        "nrr",
        vec![always_false, ValidationRule::range(0.0, 100.0, "NRR must be 0-100%").with_priority(2)],
    )]));
    let engine = engine(&bench, EngineConfig::default());

    let result = engine.validate(Some(150.0), "nrr", &ValidationContext::new()).await.unwrap();

    assert!(!result.is_valid);
    assert_eq!(result.messages().collect::<Vec<_>>(), ["NRR must be 0-100%"]);
}

#[tokio::test(start_paused = true)]
async fn test_one_failed_fetch_does_not_fail_the_batch() {
    let bench = Arc::new(nrr_bench().failing("saas-mid", usize::MAX));
    let engine = engine(&bench, EngineConfig::default());

    let outcome = engine
        .calculate_batch(vec![request(130.0, "saas-smb"), request(100.0, "saas-mid"), request(90.0, "saas-smb")])
        .await
        .unwrap();

    let states: Vec<ItemState> = outcome.items.iter().map(|item| item.outcome.state()).collect();
    assert_eq!(states, [ItemState::Completed, ItemState::Failed, ItemState::Completed]);
    assert!(matches!(
        outcome.items[1].outcome.error(),
        Some(BenchError::DistributionFetch { peer_group_id, .. }) if peer_group_id == "saas-mid"
    ));
    assert!(!outcome.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_requests_run_in_sequential_waves() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(
        &bench,
        EngineConfig {
            batch_size: 3,
            ..EngineConfig::default()
        },
    );

    let requests: Vec<_> = (0..7_i32).map(|i| request(100.0 + f64::from(i), "saas-smb")).collect();
    let outcome = engine.calculate_batch(requests).await.unwrap();

    assert_eq!(outcome.progress.waves, 3);
    assert_eq!(outcome.progress.total, 7);
    assert_eq!(outcome.count(ItemState::Completed), 7);
    assert_eq!(bench.max_in_flight.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_and_unknown_requests_never_reach_a_provider() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(&bench, EngineConfig::default());

    let outcome = engine
        .calculate_batch(vec![
            request(250.0, "saas-smb"),
            CalculationRequest::new("churn", 3.0, "saas-smb", Timeframe::Monthly),
            request(f64::NAN, "saas-smb"),
            request(120.0, "saas-smb"),
        ])
        .await
        .unwrap();

    assert!(matches!(outcome.items[0].outcome, ItemOutcome::Invalid(_)));
    assert!(matches!(outcome.items[1].outcome.error(), Some(BenchError::UnknownMetric(id)) if id == "churn"));
    assert!(matches!(outcome.items[2].outcome.error(), Some(BenchError::InvalidInput(_))));
    assert_eq!(outcome.items[3].outcome.state(), ItemState::Completed);
    assert_eq!(outcome.progress.completed, 4);
    assert_eq!(bench.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_fetches_failing_means_providers_are_unreachable() {
    let bench = Arc::new(nrr_bench().failing("saas-smb", usize::MAX));
    let engine = engine(&bench, EngineConfig::default());

    let err = engine
        .calculate_batch(vec![request(130.0, "saas-smb"), request(90.0, "saas-smb")])
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::ProvidersUnreachable { failed: 2 }));
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out() {
    let bench = Arc::new(nrr_bench().slow("saas-mid", Duration::from_secs(30)));
    let engine = engine(
        &bench,
        EngineConfig {
            fetch_timeout: Duration::from_secs(10),
            ..EngineConfig::default()
        },
    );

    let outcome = engine
        .calculate_batch(vec![request(130.0, "saas-smb"), request(100.0, "saas-mid")])
        .await
        .unwrap();

    let error = outcome.items[1].outcome.error().unwrap();
    assert!(matches!(error, BenchError::Timeout { after, .. } if *after == Duration::from_secs(10)));
    assert!(error.is_retriable());
    assert_eq!(outcome.items[0].outcome.state(), ItemState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_retry_failed_only_reruns_failures() {
    let bench = Arc::new(nrr_bench().failing("saas-mid", 1));
    let engine = engine(&bench, EngineConfig::default());

    let first = engine
        .calculate_batch(vec![request(130.0, "saas-smb"), request(100.0, "saas-mid"), request(5000.0, "saas-smb")])
        .await
        .unwrap();
    assert_eq!(first.items[1].outcome.state(), ItemState::Failed);
    assert_eq!(bench.calls(), 2);

    let retried = engine.retry_failed(&first).await.unwrap();

    assert_eq!(bench.calls(), 3);
    assert_eq!(retried.items[0].outcome.state(), ItemState::Completed);
    assert_eq!(retried.items[1].outcome.state(), ItemState::Completed);
    assert_eq!(retried.items[2].outcome.state(), ItemState::Invalid);
    assert_eq!(retried.items[1].request, request(100.0, "saas-mid"));
    assert_eq!(retried.progress.waves, 1);
}

#[tokio::test(start_paused = true)]
async fn test_results_are_cached_until_expiry() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(
        &bench,
        EngineConfig {
            result_ttl: Duration::from_secs(60),
            ..EngineConfig::default()
        },
    );

    let _ = engine.calculate_batch(vec![request(130.0, "saas-smb")]).await.unwrap();
    let again = engine.calculate_batch(vec![request(130.0, "saas-smb")]).await.unwrap();

    assert!(matches!(again.items[0].outcome, ItemOutcome::Completed { from_cache: true, .. }));
    assert_eq!(again.progress.waves, 0);
    assert_eq!(bench.calls(), 1);
    assert_eq!(engine.cache_status().results.entries, 1);

    tokio::time::advance(Duration::from_secs(61)).await;

    let expired = engine.calculate_batch(vec![request(130.0, "saas-smb")]).await.unwrap();
    assert!(matches!(expired.items[0].outcome, ItemOutcome::Completed { from_cache: false, .. }));
    assert_eq!(bench.calls(), 2);

    engine.invalidate_results();
    assert_eq!(engine.cache_status().results.entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_distribution_fails_the_item() {
    let bench = Arc::new(nrr_bench().with_distribution("broken", distribution([60.0, 80.0, 70.0, 120.0, 140.0])));
    let engine = engine(&bench, EngineConfig::default());

    let outcome = engine
        .calculate_batch(vec![request(130.0, "saas-smb"), request(130.0, "broken")])
        .await
        .unwrap();

    assert!(matches!(outcome.items[1].outcome.error(), Some(BenchError::InvalidDistribution(_))));
    assert_eq!(engine.cache_status().results.entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_comparison_caches_distributions() {
    let bench = Arc::new(nrr_bench().with_distribution("broken", distribution([60.0, 80.0, 70.0, 120.0, 140.0])));
    let registry = Arc::new(DefinitionRegistry::new(Arc::clone(&bench), Duration::from_secs(600)));
    let service = ComparisonService::new(registry, Arc::clone(&bench), Duration::from_secs(300), Duration::from_secs(10));

    let first = service.compare(130.0, "nrr", "saas-smb").await.unwrap();
    let second = service.compare(60.0, "nrr", "saas-smb").await.unwrap();

    assert!((first.percentile - 82.5).abs() < 1e-9);
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert!(second.percentile.abs() < f64::EPSILON);
    assert_eq!(bench.calls(), 1);

    let err = service.compare(100.0, "nrr", "broken").await.unwrap_err();
    assert!(matches!(err, BenchError::InvalidDistribution(_)));
    let _ = service.compare(100.0, "nrr", "broken").await.unwrap_err();
    assert_eq!(bench.calls(), 3);
    assert_eq!(service.cache_status().entries, 1);

    assert!(service.invalidate("nrr", "saas-smb"));
    let refetched = service.compare(130.0, "nrr", "saas-smb").await.unwrap();
    assert!(!refetched.from_cache);
    assert_eq!(bench.calls(), 4);

    let unknown = service.compare(1.0, "churn", "saas-smb").await.unwrap_err();
    assert!(matches!(unknown, BenchError::UnknownMetric(_)));
}

#[tokio::test(start_paused = true)]
async fn test_started_engine_sweeps_unread_results() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(
        &bench,
        EngineConfig {
            result_ttl: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(1),
            ..EngineConfig::default()
        },
    );

    engine.start();
    let _ = engine.calculate_batch(vec![request(130.0, "saas-smb")]).await.unwrap();
    assert_eq!(engine.cache_status().results.entries, 1);

    tokio::time::sleep(Duration::from_secs(7)).await;

    let status = engine.cache_status();
    assert_eq!(status.results.entries, 0);
    assert_eq!(status.definitions.entries, 1);
    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stopped_comparison_service_keeps_expired_entries() {
    let bench = Arc::new(nrr_bench());
    let registry = Arc::new(DefinitionRegistry::new(Arc::clone(&bench), Duration::from_secs(600)));
    let service = ComparisonService::new(registry, Arc::clone(&bench), Duration::from_secs(5), Duration::from_secs(10));

    service.start(Duration::from_secs(1));
    let _ = service.compare(130.0, "nrr", "saas-smb").await.unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(service.cache_status().entries, 0);

    service.stop();
    let _ = service.compare(130.0, "nrr", "saas-smb").await.unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(service.cache_status().entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_validations_are_memoised_per_context() {
    let bench = Arc::new(nrr_bench());
    let engine = engine(&bench, EngineConfig::default());
    let capped = ValidationContext::new().with("cap", ContextValue::Number(150.0));

    let first = engine.validate(Some(120.0), "nrr", &capped).await.unwrap();
    let again = engine.validate(Some(120.0), "nrr", &capped).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(engine.cache_status().validations.entries, 1);

    let _ = engine.validate(Some(120.0), "nrr", &ValidationContext::new()).await.unwrap();
    assert_eq!(engine.cache_status().validations.entries, 2);

    engine.invalidate_results();
    assert_eq!(engine.cache_status().validations.entries, 0);
}
