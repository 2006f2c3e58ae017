//! SKR chart-of-accounts identifiers used in the metadata row.

use serde::{Deserialize, Serialize};

/// Standard German chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChartOfAccounts {
    /// Standardkontenrahmen 03 (most common for SMBs).
    SKR03,
    /// Standardkontenrahmen 04 (used by larger companies, Bilanzrecht).
    SKR04,
}

impl ChartOfAccounts {
    /// SKR identifier for the EXTF header.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SKR03 => "03",
            Self::SKR04 => "04",
        }
    }

    /// Parse the two-digit SKR field of the EXTF header.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "03" => Some(Self::SKR03),
            "04" => Some(Self::SKR04),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for chart in [ChartOfAccounts::SKR03, ChartOfAccounts::SKR04] {
            assert_eq!(ChartOfAccounts::from_code(chart.code()), Some(chart));
        }
        assert_eq!(ChartOfAccounts::from_code("3"), None);
    }
}
