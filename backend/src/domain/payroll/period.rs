//! Pay period entity and its lifecycle state machine.
//!
//! ```text
//! draft --run--> reviewed --finalize--> finalized --reopen--> draft
//! ```
//!
//! Every other `(status, action)` pair is rejected without touching data.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::TenantId;

/// Lifecycle status of a pay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Inputs are being collected; results may be stale or absent.
    Draft,
    /// Results were calculated and await sign-off.
    Reviewed,
    /// Results are frozen and payslips exist.
    Finalized,
}

impl PeriodStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Draft, Self::Reviewed, Self::Finalized];

    /// Stable storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Reviewed => "reviewed",
            Self::Finalized => "finalized",
        }
    }

    /// Apply a lifecycle action, returning the resulting status.
    ///
    /// # Examples
    /// ```
    /// use payroll::domain::payroll::{PeriodAction, PeriodStatus};
    ///
    /// assert_eq!(PeriodStatus::Draft.apply(PeriodAction::Run), Ok(PeriodStatus::Reviewed));
    /// assert!(PeriodStatus::Draft.apply(PeriodAction::Finalize).is_err());
    /// ```
    pub fn apply(self, action: PeriodAction) -> Result<Self, InvalidTransition> {
        if self == action.required_status() {
            Ok(action.target_status())
        } else {
            Err(InvalidTransition { from: self, action })
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pay period status: {0}")]
pub struct ParsePeriodStatusError(pub String);

impl FromStr for PeriodStatus {
    type Err = ParsePeriodStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ParsePeriodStatusError(value.to_owned()))
    }
}

/// Lifecycle actions an HR user can trigger on a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodAction {
    /// Calculate results for every active employee.
    Run,
    /// Freeze results and create payslips.
    Finalize,
    /// Discard derived artifacts and return to draft.
    Reopen,
}

impl PeriodAction {
    /// Every action.
    pub const ALL: [Self; 3] = [Self::Run, Self::Finalize, Self::Reopen];

    /// Status the period must hold for the action to proceed.
    pub fn required_status(self) -> PeriodStatus {
        match self {
            Self::Run => PeriodStatus::Draft,
            Self::Finalize => PeriodStatus::Reviewed,
            Self::Reopen => PeriodStatus::Finalized,
        }
    }

    /// Status the period holds once the action succeeds.
    pub fn target_status(self) -> PeriodStatus {
        match self {
            Self::Run => PeriodStatus::Reviewed,
            Self::Finalize => PeriodStatus::Finalized,
            Self::Reopen => PeriodStatus::Draft,
        }
    }

    /// Verb used in messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Finalize => "finalize",
            Self::Reopen => "reopen",
        }
    }
}

/// A lifecycle action attempted from the wrong status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a {from} pay period", .action.as_str())]
pub struct InvalidTransition {
    /// Status observed when the action was attempted.
    pub from: PeriodStatus,
    /// Rejected action.
    pub action: PeriodAction,
}

/// Validation errors for period dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeriodValidationError {
    /// The start date falls after the end date.
    #[error("startDate must not be after endDate")]
    InvalidDates,
}

impl PeriodValidationError {
    /// Stable detail code for adapters.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidDates => "invalid_dates",
        }
    }
}

/// Inclusive calendar range covered by a pay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl PeriodBounds {
    /// Validate and construct period bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodValidationError> {
        if start > end {
            return Err(PeriodValidationError::InvalidDates);
        }
        Ok(Self { start, end })
    }

    /// First day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the period.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls within the period, inclusive of both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the period, inclusive; always at least one.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Intersect an inclusive range with the period.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let clipped_start = start.max(self.start);
        let clipped_end = end.min(self.end);
        (clipped_start <= clipped_end).then_some((clipped_start, clipped_end))
    }
}

/// Tenant-scoped pay period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPeriod {
    /// Period identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Pay schedule the period belongs to.
    pub schedule_id: Uuid,
    /// Dates covered by the period.
    pub bounds: PeriodBounds,
    /// Current lifecycle status.
    pub status: PeriodStatus,
    /// Set when the period is finalized, cleared on reopen.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl PayPeriod {
    /// Build a new draft period.
    pub fn draft(tenant_id: TenantId, schedule_id: Uuid, bounds: PeriodBounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            schedule_id,
            bounds,
            status: PeriodStatus::Draft,
            finalized_at: None,
        }
    }

    /// Check that `action` is allowed from the current status.
    pub fn check(&self, action: PeriodAction) -> Result<PeriodStatus, InvalidTransition> {
        self.status.apply(action)
    }
}
