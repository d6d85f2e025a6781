//! Wire shapes exchanged with the document renderer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payroll::PayslipRenderPayload;

/// Request body for `POST /render`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RenderRequestDto<'a> {
    pub template: &'static str,
    pub payslip_id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub email: &'a str,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub gross: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
    pub currency: &'a str,
}

impl<'a> From<&'a PayslipRenderPayload> for RenderRequestDto<'a> {
    fn from(payload: &'a PayslipRenderPayload) -> Self {
        Self {
            template: "payslip",
            payslip_id: payload.payslip_id,
            employee_id: payload.employee_id,
            employee_name: format!("{} {}", payload.first_name, payload.last_name),
            email: &payload.email,
            period_start: payload.period_start,
            period_end: payload.period_end,
            gross: payload.gross,
            deductions: payload.deductions,
            net: payload.net,
            currency: &payload.currency,
        }
    }
}

/// Successful renderer reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RenderResponseDto {
    pub file_ref: String,
}
