use crate::metrics::Timeframe;
use core::time::Duration;
use ohno::AppError;
use std::sync::Arc;

/// Errors produced by the validation and benchmarking engine.
///
/// Provider failures carry the underlying [`AppError`] behind an `Arc` so that
/// per-item failures can be cloned into batch outcomes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BenchError {
    #[error("could not fetch metric definitions: {cause}")]
    DefinitionFetch { cause: Arc<AppError> },

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not fetch distribution of '{metric_id}' for peer group '{peer_group_id}': {cause}")]
    DistributionFetch {
        metric_id: String,
        peer_group_id: String,
        cause: Arc<AppError>,
    },

    #[error("could not fetch {timeframe} trend of '{metric_id}': {cause}")]
    TrendFetch {
        metric_id: String,
        timeframe: Timeframe,
        cause: Arc<AppError>,
    },

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout { operation: String, after: Duration },

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("all {failed} fetched requests failed, benchmark providers appear unreachable")]
    ProvidersUnreachable { failed: usize },
}

/// Per-item failure recorded in a batch outcome.
pub type ItemError = BenchError;

impl BenchError {
    pub(crate) fn definition_fetch(cause: AppError) -> Self {
        Self::DefinitionFetch { cause: Arc::new(cause) }
    }

    /// Returns whether the error came from an external provider call or its timeout.
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::DistributionFetch { .. } | Self::TrendFetch { .. } | Self::Timeout { .. }
        )
    }

    /// Returns whether repeating the same request could succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        self.is_provider_failure() || matches!(self, Self::InvalidDistribution(_))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use ohno::app_err;

    #[test]
    fn messages_name_their_subject() {
        let err = BenchError::DistributionFetch {
            metric_id: "nrr".into(),
            peer_group_id: "saas-smb".into(),
            cause: Arc::new(app_err!("HTTP 503")),
        };
        let msg = err.to_string();
        assert!(msg.contains("nrr"));
        assert!(msg.contains("saas-smb"));
        assert!(msg.contains("HTTP 503"));

        let err = BenchError::Timeout {
            operation: "trend fetch".into(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "trend fetch timed out after 250ms");
    }

    #[test]
    fn classification() {
        let timeout = BenchError::Timeout {
            operation: "x".into(),
            after: Duration::from_secs(1),
        };
        assert!(timeout.is_provider_failure());
        assert!(timeout.is_retriable());

        let invalid = BenchError::InvalidDistribution("p50 below p25".into());
        assert!(!invalid.is_provider_failure());
        assert!(invalid.is_retriable());

        assert!(!BenchError::UnknownMetric("x".into()).is_retriable());
        assert!(!BenchError::InvalidInput("NaN".into()).is_retriable());
    }
}
