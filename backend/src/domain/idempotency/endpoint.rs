//! Endpoint discriminators for idempotent operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation protected by the idempotency guard.
///
/// Keys are isolated per endpoint so the same caller key may be reused
/// across different operations.
///
/// # Example
///
/// ```
/// # use payroll::domain::idempotency::IdempotentEndpoint;
/// assert_eq!(IdempotentEndpoint::PayrollFinalize.as_str(), "payroll.finalize");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdempotentEndpoint {
    /// `POST /api/v1/payroll/periods/{id}/finalize`.
    #[serde(rename = "payroll.finalize")]
    PayrollFinalize,
}

impl IdempotentEndpoint {
    /// All endpoint variants.
    pub const ALL: [Self; 1] = [Self::PayrollFinalize];

    /// Database string representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayrollFinalize => "payroll.finalize",
        }
    }
}

impl fmt::Display for IdempotentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown endpoint string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown idempotent endpoint '{input}'")]
pub struct ParseIdempotentEndpointError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for IdempotentEndpoint {
    type Err = ParseIdempotentEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.as_str() == s)
            .ok_or_else(|| ParseIdempotentEndpointError {
                input: s.to_owned(),
            })
    }
}
