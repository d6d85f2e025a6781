//! Port for pay period persistence and guarded status transitions.
//!
//! Every status change is a conditional update on the expected status, so
//! concurrent lifecycle calls on the same period serialise on the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{PayPeriod, Payslip, PeriodStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by pay period repository adapters.
    pub enum PayPeriodRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "pay period repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "pay period repository query failed: {message}",
    }
}

/// Derived rows removed by a reopen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReopenedArtifacts {
    /// Payroll results deleted.
    pub results_deleted: u64,
    /// Run failures deleted.
    pub failures_deleted: u64,
    /// Payslips deleted.
    pub payslips_deleted: u64,
}

/// Port for reading and transitioning pay periods.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayPeriodRepository: Send + Sync {
    /// Insert a new draft period.
    async fn create(&self, period: &PayPeriod) -> Result<(), PayPeriodRepositoryError>;

    /// Find a period owned by the tenant.
    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<PayPeriod>, PayPeriodRepositoryError>;

    /// Move the period from `from` to `to`.
    ///
    /// Returns `false` when the period was not in `from`; nothing changes
    /// in that case.
    async fn transition_status(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        from: PeriodStatus,
        to: PeriodStatus,
    ) -> Result<bool, PayPeriodRepositoryError>;

    /// Finalize a reviewed period in one transaction.
    ///
    /// Sets `finalized_at`, moves the status to `finalized` and inserts one
    /// payslip per existing result, skipping pairs that already have one.
    /// Returns the newly inserted payslips, or `None` when the period was not
    /// `reviewed`.
    async fn finalize(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        finalized_at: DateTime<Utc>,
    ) -> Result<Option<Vec<Payslip>>, PayPeriodRepositoryError>;

    /// Reopen a finalized period in one transaction.
    ///
    /// Deletes results, run failures and payslips, clears `finalized_at`
    /// and resets the status to `draft`. Returns `None` when the period was
    /// not `finalized`.
    async fn reopen(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<ReopenedArtifacts>, PayPeriodRepositoryError>;
}
