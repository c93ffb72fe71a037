use super::{CalculationRequest, CalculationResult, ItemError};
use crate::expr::ValidationResult;
use strum::Display;

/// Lifecycle of one request within a batch.
///
/// `Pending → Validating → (Invalid | CacheHit | Fetching) → (Completed | Failed)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ItemState {
    Pending,
    Validating,
    Invalid,
    CacheHit,
    Fetching,
    Completed,
    Failed,
}

/// The terminal result of one request.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Completed { result: CalculationResult, from_cache: bool },
    Invalid(ValidationResult),
    Failed(ItemError),
}

impl ItemOutcome {
    #[must_use]
    pub const fn state(&self) -> ItemState {
        match self {
            Self::Completed { .. } => ItemState::Completed,
            Self::Invalid(_) => ItemState::Invalid,
            Self::Failed(_) => ItemState::Failed,
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<&CalculationResult> {
        match self {
            Self::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ItemError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// One request together with its outcome.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub request: CalculationRequest,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    /// Requests that reached a terminal state.
    pub completed: u64,
    pub total: u64,

    /// Fetch waves that ran.
    pub waves: usize,
}

/// Every request of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub items: Vec<BatchItem>,
    pub progress: BatchProgress,
}

impl BatchOutcome {
    pub fn results(&self) -> impl Iterator<Item = &CalculationResult> {
        self.items.iter().filter_map(|item| item.outcome.result())
    }

    pub fn count(&self, state: ItemState) -> usize {
        self.items.iter().filter(|item| item.outcome.state() == state).count()
    }

    /// Returns whether every request completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.outcome.state() == ItemState::Completed)
    }
}
