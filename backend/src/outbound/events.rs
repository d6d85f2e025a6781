//! Tracing-backed notification and audit adapters.
//!
//! Events are emitted on dedicated targets so a deployment can route them to
//! a mail relay or an audit sink through its subscriber configuration
//! (`RUST_LOG=payroll::notify=info,payroll::audit=info`).

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    PayrollAuditLog, PayrollAuditLogError, PayrollNotifier, PayrollNotifierError,
    PayslipNotification, PeriodReopenedEvent,
};

/// Log target for payslip availability notices.
pub const NOTIFY_TARGET: &str = "payroll::notify";
/// Log target for audit entries.
pub const AUDIT_TARGET: &str = "payroll::audit";

/// Emits payroll events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPayrollEvents;

#[async_trait]
impl PayrollNotifier for TracingPayrollEvents {
    async fn payslip_available(
        &self,
        notification: &PayslipNotification,
    ) -> Result<(), PayrollNotifierError> {
        info!(
            target: NOTIFY_TARGET,
            tenant_id = %notification.tenant_id,
            period_id = %notification.period_id,
            employee_id = %notification.employee_id,
            payslip_id = %notification.payslip_id,
            "payslip available"
        );
        Ok(())
    }
}

#[async_trait]
impl PayrollAuditLog for TracingPayrollEvents {
    async fn period_reopened(
        &self,
        event: &PeriodReopenedEvent,
    ) -> Result<(), PayrollAuditLogError> {
        info!(
            target: AUDIT_TARGET,
            action = "payroll.period.reopened",
            tenant_id = %event.tenant_id,
            user_id = %event.user_id,
            period_id = %event.period_id,
            reason = %event.reason,
            results_deleted = event.results_deleted,
            payslips_deleted = event.payslips_deleted,
            occurred_at = %event.occurred_at,
            "pay period reopened"
        );
        Ok(())
    }
}
