use crate::Result;
use crate::facts::{BenchmarkSource, DefinitionSource, DistributionPoint, TrendSeries};
use crate::metrics::{MetricDefinition, Timeframe};
use camino::Utf8Path;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::Deserialize;
use std::collections::HashMap;

const LOG_TARGET: &str = "  fixtures";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDocument {
    #[serde(default)]
    definitions: Vec<MetricDefinition>,

    #[serde(default)]
    distributions: Vec<DistributionFixture>,

    #[serde(default)]
    trends: Vec<TrendSeries>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistributionFixture {
    metric_id: String,
    peer_group_id: String,
    distribution: DistributionPoint,
}

/// Serves the catalog, distributions and trends from a single JSON document.
///
/// ```json
/// {
///   "definitions": [ ... ],
///   "distributions": [ { "metric_id": "nrr", "peer_group_id": "saas-smb", "distribution": { ... } } ],
///   "trends": [ { "metric_id": "nrr", "timeframe": "annual", "points": [ ... ] } ]
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    definitions: Vec<MetricDefinition>,
    distributions: HashMap<(String, String), DistributionPoint>,
    trends: HashMap<(String, Timeframe), TrendSeries>,
}

impl FixtureProvider {
    /// Load fixtures from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).into_app_err_with(|| format!("could not read fixtures file '{path}'"))?;
        let provider = Self::from_json(&text).map_err(|e| e.enrich_with(|| format!("could not load fixtures from '{path}'")))?;

        log::info!(
            target: LOG_TARGET,
            "Loaded {} definitions, {} distributions and {} trends from '{path}'",
            provider.definitions.len(),
            provider.distributions.len(),
            provider.trends.len()
        );

        Ok(provider)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let doc: FixtureDocument = serde_json::from_str(text).into_app_err("malformed fixtures document")?;

        Ok(Self {
            definitions: doc.definitions,
            distributions: doc
                .distributions
                .into_iter()
                .map(|d| ((d.metric_id, d.peer_group_id), d.distribution))
                .collect(),
            trends: doc
                .trends
                .into_iter()
                .map(|t| ((t.metric_id.clone(), t.timeframe), t))
                .collect(),
        })
    }
}

impl DefinitionSource for FixtureProvider {
    async fn fetch_definitions(&self) -> Result<Vec<MetricDefinition>> {
        Ok(self.definitions.clone())
    }
}

impl BenchmarkSource for FixtureProvider {
    async fn fetch_distribution(&self, metric_id: &str, peer_group_id: &str) -> Result<DistributionPoint> {
        self.distributions
            .get(&(metric_id.to_string(), peer_group_id.to_string()))
            .cloned()
            .ok_or_else(|| app_err!("no distribution of '{metric_id}' for peer group '{peer_group_id}' in fixtures"))
    }

    async fn fetch_trend(&self, metric_id: &str, timeframe: Timeframe) -> Result<TrendSeries> {
        self.trends
            .get(&(metric_id.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| app_err!("no {timeframe} trend of '{metric_id}' in fixtures"))
    }
}
