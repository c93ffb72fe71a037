use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Business area a metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Retention,
    Efficiency,
    Sales,
    Financial,
}
