//! Ports for post-commit payroll notifications and the audit trail.
//!
//! Both are best-effort: callers log failures and carry on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{TenantId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification adapters.
    pub enum PayrollNotifierError {
        /// Delivery failed.
        Delivery { message: String } => "payroll notification failed: {message}",
    }
}

define_port_error! {
    /// Errors raised by audit adapters.
    pub enum PayrollAuditLogError {
        /// The audit entry could not be written.
        Write { message: String } => "payroll audit write failed: {message}",
    }
}

/// A payslip became available to an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipNotification {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Finalized period.
    pub period_id: Uuid,
    /// Recipient employee.
    pub employee_id: Uuid,
    /// New payslip.
    pub payslip_id: Uuid,
}

/// A finalized period was reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodReopenedEvent {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Reopened period.
    pub period_id: Uuid,
    /// Caller-supplied reason.
    pub reason: String,
    /// Results deleted.
    pub results_deleted: u64,
    /// Payslips deleted.
    pub payslips_deleted: u64,
    /// When the reopen committed.
    pub occurred_at: DateTime<Utc>,
}

/// Port for employee-facing notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollNotifier: Send + Sync {
    /// Tell an employee their payslip is available.
    async fn payslip_available(
        &self,
        notification: &PayslipNotification,
    ) -> Result<(), PayrollNotifierError>;
}

/// Port for the audit trail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollAuditLog: Send + Sync {
    /// Record a reopen and its reason.
    async fn period_reopened(&self, event: &PeriodReopenedEvent)
    -> Result<(), PayrollAuditLogError>;
}

/// Notifier and audit sink that discard everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayrollEvents;

#[async_trait]
impl PayrollNotifier for FixturePayrollEvents {
    async fn payslip_available(
        &self,
        _notification: &PayslipNotification,
    ) -> Result<(), PayrollNotifierError> {
        Ok(())
    }
}

#[async_trait]
impl PayrollAuditLog for FixturePayrollEvents {
    async fn period_reopened(
        &self,
        _event: &PeriodReopenedEvent,
    ) -> Result<(), PayrollAuditLogError> {
        Ok(())
    }
}
