//! Payslip records and the payload handed to the external renderer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TenantId;

/// Payslip for one employee in one finalized period.
///
/// `file_ref` is filled lazily by the renderer; its absence is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payslip {
    /// Payslip identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Finalized period.
    pub period_id: Uuid,
    /// Employee the payslip belongs to.
    pub employee_id: Uuid,
    /// Reference to the rendered document, once available.
    pub file_ref: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Optional filters for listing payslips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayslipFilter {
    /// Restrict to one period.
    pub period_id: Option<Uuid>,
    /// Restrict to one employee.
    pub employee_id: Option<Uuid>,
}

impl PayslipFilter {
    /// Whether a payslip passes the filter.
    pub fn matches(&self, payslip: &Payslip) -> bool {
        self.period_id.is_none_or(|id| id == payslip.period_id)
            && self.employee_id.is_none_or(|id| id == payslip.employee_id)
    }
}

/// Document content sent to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayslipRenderPayload {
    /// Payslip being rendered.
    pub payslip_id: Uuid,
    /// Employee identifier.
    pub employee_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Gross pay.
    pub gross: Decimal,
    /// Total deductions.
    pub deductions: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// ISO currency.
    pub currency: String,
}
