//! Port for payslip records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{Payslip, PayslipFilter, PayslipRenderPayload};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payslip repository adapters.
    pub enum PayslipRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payslip repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payslip repository query failed: {message}",
    }
}

/// Port for listing, creating and annotating payslips.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayslipRepository: Send + Sync {
    /// Payslips of the tenant matching the filter, newest first.
    async fn list(
        &self,
        tenant_id: &TenantId,
        filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError>;

    /// Find a payslip owned by the tenant.
    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<Payslip>, PayslipRepositoryError>;

    /// Insert a payslip for every result of the period that lacks one.
    async fn create_missing_for_period(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError>;

    /// Document content for a payslip, from its result, employee and period.
    async fn render_payload(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<PayslipRenderPayload>, PayslipRepositoryError>;

    /// Store the rendered document reference; `false` when the payslip is
    /// gone.
    async fn set_file_ref(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
        file_ref: &str,
    ) -> Result<bool, PayslipRepositoryError>;
}
