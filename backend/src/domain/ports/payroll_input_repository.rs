//! Port for the pay element catalog, input lines and adjustments.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{ClassifiedInput, PayElement, PayrollAdjustment, PayrollInput};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payroll input repository adapters.
    pub enum PayrollInputRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payroll input repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payroll input repository query failed: {message}",
    }
}

/// Port for mutable payroll inputs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollInputRepository: Send + Sync {
    /// Insert a catalog element.
    async fn create_element(&self, element: &PayElement)
    -> Result<(), PayrollInputRepositoryError>;

    /// Catalog of a tenant ordered by name.
    async fn list_elements(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<PayElement>, PayrollInputRepositoryError>;

    /// Find a catalog element owned by the tenant.
    async fn find_element(
        &self,
        tenant_id: &TenantId,
        element_id: Uuid,
    ) -> Result<Option<PayElement>, PayrollInputRepositoryError>;

    /// Append an input line.
    async fn add_input(&self, input: &PayrollInput) -> Result<(), PayrollInputRepositoryError>;

    /// Input amounts of one employee in one period, joined to their
    /// element type.
    async fn list_classified_inputs(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<ClassifiedInput>, PayrollInputRepositoryError>;

    /// Insert an adjustment.
    async fn add_adjustment(
        &self,
        adjustment: &PayrollAdjustment,
    ) -> Result<(), PayrollInputRepositoryError>;

    /// Delete an adjustment; `false` when it does not exist in the period.
    async fn delete_adjustment(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<bool, PayrollInputRepositoryError>;

    /// Adjustments recorded for one employee in one period.
    async fn list_adjustments(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<PayrollAdjustment>, PayrollInputRepositoryError>;
}
