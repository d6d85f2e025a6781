//! Read-only ports onto HR core data: employees and approved leave.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{EmployeePayProfile, PeriodBounds, UnpaidLeaveSpan};

use super::define_port_error;

define_port_error! {
    /// Errors raised by HR core read adapters.
    pub enum EmployeeDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "employee directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "employee directory query failed: {message}",
    }
}

/// Port for employee lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Pay profiles of the tenant's active employees.
    async fn list_active_profiles(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<EmployeePayProfile>, EmployeeDirectoryError>;

    /// Resolve an employee by email, case-insensitively.
    async fn find_employee_id_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<Uuid>, EmployeeDirectoryError>;

    /// Whether the employee belongs to the tenant.
    async fn employee_exists(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
    ) -> Result<bool, EmployeeDirectoryError>;
}

/// Port for approved unpaid leave.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveRepository: Send + Sync {
    /// Approved leave of an unpaid type overlapping the period, unclipped.
    async fn unpaid_leave_overlapping(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        bounds: &PeriodBounds,
    ) -> Result<Vec<UnpaidLeaveSpan>, EmployeeDirectoryError>;
}
