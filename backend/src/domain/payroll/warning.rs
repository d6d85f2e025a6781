//! Anomaly codes attached to payroll results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Deterministic anomaly flags raised by a payroll run.
///
/// Ordering follows declaration order so warning sets serialise stably.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// The employee has no bank account on file.
    MissingBankAccount,
    /// Net pay came out below zero.
    NegativeNet,
    /// Net pay moved more than 50% from the previous finalized period.
    NetVariance,
    /// The employee could not be calculated; recorded as a run failure.
    CalculationFailed,
}

impl WarningCode {
    /// Every warning code.
    pub const ALL: [Self; 4] = [
        Self::MissingBankAccount,
        Self::NegativeNet,
        Self::NetVariance,
        Self::CalculationFailed,
    ];

    /// Stable storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingBankAccount => "missing_bank_account",
            Self::NegativeNet => "negative_net",
            Self::NetVariance => "net_variance",
            Self::CalculationFailed => "calculation_failed",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown warning codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown warning code: {0}")]
pub struct ParseWarningCodeError(pub String);

impl FromStr for WarningCode {
    type Err = ParseWarningCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| ParseWarningCodeError(value.to_owned()))
    }
}
