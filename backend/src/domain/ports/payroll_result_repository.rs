//! Port for calculated payroll results and soft run failures.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{PayrollResult, PayrollRunFailure, RegisterLine};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payroll result repository adapters.
    pub enum PayrollResultRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payroll result repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payroll result repository query failed: {message}",
    }
}

/// Port for writing and reading per-employee payroll results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollResultRepository: Send + Sync {
    /// Insert or replace the result for `(period_id, employee_id)`.
    async fn upsert_result(&self, result: &PayrollResult)
    -> Result<(), PayrollResultRepositoryError>;

    /// Replace every run failure of the period with `failures`.
    async fn replace_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        failures: &[PayrollRunFailure],
    ) -> Result<(), PayrollResultRepositoryError>;

    /// Results of a period.
    async fn list_results(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollResult>, PayrollResultRepositoryError>;

    /// Run failures recorded by the latest run of a period.
    async fn list_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollRunFailure>, PayrollResultRepositoryError>;

    /// Results joined to employee names, ordered by last name, first name
    /// and employee id.
    async fn list_register_lines(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<RegisterLine>, PayrollResultRepositoryError>;

    /// Net of the employee's latest finalized result in a period ending
    /// before `before`.
    async fn latest_finalized_net(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        before: NaiveDate,
    ) -> Result<Option<Decimal>, PayrollResultRepositoryError>;
}
