use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Reporting period a metric is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Timeframe {
    Monthly,
    Quarterly,
    Annual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn display_matches_wire_format() {
        assert_eq!(Timeframe::Monthly.to_string(), "monthly");
        assert_eq!(serde_json::to_string(&Timeframe::Quarterly).unwrap(), "\"quarterly\"");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Timeframe::from_str("Annual").unwrap(), Timeframe::Annual);
        assert_eq!(Timeframe::from_str("monthly").unwrap(), Timeframe::Monthly);
        let _ = Timeframe::from_str("weekly").unwrap_err();
    }
}
