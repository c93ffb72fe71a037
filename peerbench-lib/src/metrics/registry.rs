//! The metric definition catalog and its cache.

use super::{MetricDefinition, RuleKind, ValidationRule};
use crate::Result;
use crate::bench::BenchError;
use crate::facts::{CacheStatus, DefinitionSource, ExpiringCache};
use core::time::Duration;
use ohno::bail;
use std::collections::HashMap;
use std::sync::Arc;

const LOG_TARGET: &str = "  registry";

/// An immutable snapshot of every metric definition, with rules indexed by metric.
#[derive(Debug)]
pub struct Catalog {
    definitions: Vec<MetricDefinition>,
    by_id: HashMap<String, usize>,
    rules: Vec<Vec<ValidationRule>>,
}

impl Catalog {
    /// Index `definitions`, sorting each metric's rules by descending priority.
    ///
    /// Rules with equal priority keep their catalog order.
    ///
    /// # Errors
    /// Fails if two definitions share an id or a range rule has `min > max`.
    pub fn build(definitions: Vec<MetricDefinition>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(definitions.len());
        let mut rules = Vec::with_capacity(definitions.len());

        for (index, def) in definitions.iter().enumerate() {
            if by_id.insert(def.id.clone(), index).is_some() {
                bail!("duplicate metric definition '{}'", def.id);
            }

            for rule in &def.rules {
                if let RuleKind::Range { min, max } = rule.kind
                    && min > max
                {
                    bail!("metric '{}' has a range rule with min {min} above max {max}", def.id);
                }
            }

            let mut sorted = def.rules.clone();
            sorted.sort_by_key(|rule| core::cmp::Reverse(rule.priority));
            rules.push(sorted);
        }

        Ok(Self {
            definitions,
            by_id,
            rules,
        })
    }

    #[must_use]
    pub fn definition(&self, metric_id: &str) -> Option<&MetricDefinition> {
        self.by_id.get(metric_id).map(|&index| &self.definitions[index])
    }

    /// Rules for `metric_id`, highest priority first.
    #[must_use]
    pub fn rules_for(&self, metric_id: &str) -> Option<&[ValidationRule]> {
        self.by_id.get(metric_id).map(|&index| self.rules[index].as_slice())
    }

    #[must_use]
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Fetches the definition catalog on demand and keeps it for a fixed time.
///
/// A refresh replaces the whole catalog; a failed refresh leaves the previously
/// cached catalog in place.
#[derive(Debug)]
pub struct DefinitionRegistry<S> {
    source: S,
    cache: ExpiringCache<(), Arc<Catalog>>,
    ttl: Duration,
}

impl<S: DefinitionSource> DefinitionRegistry<S> {
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            cache: ExpiringCache::new("definitions"),
            ttl,
        }
    }

    /// Returns the catalog, fetching it when the cache is empty, expired, or `force_refresh` is set.
    pub async fn get_definitions(&self, force_refresh: bool) -> Result<Arc<Catalog>, BenchError> {
        if !force_refresh && let Some(catalog) = self.cache.get(&()) {
            log::debug!(target: LOG_TARGET, "Using cached catalog of {} definitions", catalog.len());
            return Ok(catalog);
        }

        log::info!(target: LOG_TARGET, "Fetching metric definitions");

        let definitions = self.source.fetch_definitions().await.map_err(|e| {
            log::error!(target: LOG_TARGET, "Could not fetch metric definitions: {e:#}");
            BenchError::definition_fetch(e)
        })?;

        let catalog = Arc::new(Catalog::build(definitions).map_err(|e| {
            log::error!(target: LOG_TARGET, "Rejected metric catalog: {e:#}");
            BenchError::definition_fetch(e)
        })?);

        log::info!(target: LOG_TARGET, "Loaded {} metric definitions", catalog.len());
        self.cache.put((), Arc::clone(&catalog), self.ttl);

        Ok(catalog)
    }

    #[must_use]
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Drop the cached catalog so that the next request fetches it again.
    pub fn invalidate(&self) {
        let _ = self.cache.invalidate(&());
    }

    /// Start the periodic sweep of the definition cache.
    pub fn start(&self, interval: Duration) {
        self.cache.start(interval);
    }

    pub fn stop(&self) {
        self.cache.stop();
    }
}
