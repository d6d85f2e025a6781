//! Best-effort work that runs after a commit and never fails the caller.

use std::fmt;

use tracing::warn;
use uuid::Uuid;

use crate::domain::TenantId;

/// Post-commit effects whose failures are logged and swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Rendering a payslip document.
    PayslipRender,
    /// Telling an employee a payslip is available.
    PayslipNotification,
    /// Writing a reopen entry to the audit trail.
    ReopenAudit,
    /// Recording a payslip reference after rendering.
    PayslipFileRef,
}

impl SideEffect {
    /// Stable label used in log events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayslipRender => "payslip_render",
            Self::PayslipNotification => "payslip_notification",
            Self::ReopenAudit => "reopen_audit",
            Self::PayslipFileRef => "payslip_file_ref",
        }
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log a failed side effect.
pub fn log_side_effect_failure(
    effect: SideEffect,
    tenant_id: &TenantId,
    period_id: Uuid,
    employee_id: Option<Uuid>,
    error: &dyn std::error::Error,
) {
    warn!(
        effect = effect.as_str(),
        tenant_id = %tenant_id,
        period_id = %period_id,
        employee_id = ?employee_id,
        error = %error,
        "payroll side effect failed"
    );
}
