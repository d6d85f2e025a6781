//! Pay period DTOs and parsing helpers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::payroll::{
    AdjustmentDraft, InputSource, PayPeriod, PayrollInputDraft, PayrollSummary, PeriodStatus,
};
use crate::domain::ports::CreatePeriodRequest;
use crate::inbound::http::validation::{
    FieldName, parse_date, parse_decimal, parse_enum, parse_optional_date, parse_optional_decimal,
    parse_uuid, require,
};

#[derive(Debug, Deserialize)]
pub(super) struct PeriodPath {
    pub(super) period_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AdjustmentPath {
    pub(super) period_id: String,
    pub(super) adjustment_id: String,
}

pub(super) fn parse_period_id(path: &str) -> Result<Uuid, Error> {
    parse_uuid(path, FieldName::new("periodId"))
}

/// Request payload for opening a pay period.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodBody {
    #[schema(format = "uuid")]
    pub schedule_id: Option<String>,
    #[schema(format = "date", example = "2026-06-01")]
    pub start_date: Option<String>,
    #[schema(format = "date", example = "2026-06-30")]
    pub end_date: Option<String>,
}

impl TryFrom<CreatePeriodBody> for CreatePeriodRequest {
    type Error = Error;

    fn try_from(body: CreatePeriodBody) -> Result<Self, Self::Error> {
        let schedule = FieldName::new("scheduleId");
        let start = FieldName::new("startDate");
        let end = FieldName::new("endDate");
        Ok(Self {
            schedule_id: parse_uuid(&require(body.schedule_id, schedule)?, schedule)?,
            start_date: parse_date(&require(body.start_date, start)?, start)?,
            end_date: parse_date(&require(body.end_date, end)?, end)?,
        })
    }
}

/// Identifier of a created resource.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBody {
    #[schema(format = "uuid")]
    pub id: String,
}

impl From<Uuid> for CreatedBody {
    fn from(id: Uuid) -> Self {
        Self { id: id.to_string() }
    }
}

/// Status reached by a lifecycle action.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatusBody {
    pub status: PeriodStatus,
}

/// Pay period view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub schedule_id: String,
    #[schema(format = "date")]
    pub start_date: String,
    #[schema(format = "date")]
    pub end_date: String,
    pub status: PeriodStatus,
    #[schema(format = "date-time")]
    pub finalized_at: Option<String>,
}

impl From<PayPeriod> for PeriodBody {
    fn from(period: PayPeriod) -> Self {
        Self {
            id: period.id.to_string(),
            schedule_id: period.schedule_id.to_string(),
            start_date: period.bounds.start().to_string(),
            end_date: period.bounds.end().to_string(),
            status: period.status,
            finalized_at: period.finalized_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Request payload for reopening a finalized period.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReopenBody {
    #[schema(example = "Overtime for two employees was missed")]
    pub reason: Option<String>,
}

/// Request payload for one input line.
///
/// Decimals are sent as strings. When `amount` is omitted or zero and
/// `units` is positive, the stored amount is `units * rate`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputBody {
    #[schema(format = "uuid")]
    pub employee_id: Option<String>,
    #[schema(format = "uuid")]
    pub element_id: Option<String>,
    #[schema(example = "8")]
    pub units: Option<String>,
    #[schema(example = "12.50")]
    pub rate: Option<String>,
    #[schema(example = "100.00")]
    pub amount: Option<String>,
    #[schema(value_type = Option<InputSource>)]
    pub source: Option<String>,
}

impl TryFrom<InputBody> for PayrollInputDraft {
    type Error = Error;

    fn try_from(body: InputBody) -> Result<Self, Self::Error> {
        let employee = FieldName::new("employeeId");
        let element = FieldName::new("elementId");
        Ok(Self {
            employee_id: parse_uuid(&require(body.employee_id, employee)?, employee)?,
            element_id: parse_uuid(&require(body.element_id, element)?, element)?,
            units: parse_optional_decimal(body.units.as_deref(), FieldName::new("units"))?
                .unwrap_or(Decimal::ZERO),
            rate: parse_optional_decimal(body.rate.as_deref(), FieldName::new("rate"))?
                .unwrap_or(Decimal::ZERO),
            amount: parse_optional_decimal(body.amount.as_deref(), FieldName::new("amount"))?
                .unwrap_or(Decimal::ZERO),
            source: body
                .source
                .as_deref()
                .map(|raw| parse_enum(raw, FieldName::new("source")))
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Outcome of a CSV import.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    pub imported: usize,
    pub skipped: usize,
}

/// Request payload for an adjustment.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentBody {
    #[schema(format = "uuid")]
    pub employee_id: Option<String>,
    #[schema(example = "Relocation allowance")]
    pub description: Option<String>,
    #[schema(example = "250.00")]
    pub amount: Option<String>,
    #[schema(format = "date")]
    pub effective_date: Option<String>,
}

impl TryFrom<AdjustmentBody> for AdjustmentDraft {
    type Error = Error;

    fn try_from(body: AdjustmentBody) -> Result<Self, Self::Error> {
        let employee = FieldName::new("employeeId");
        let amount = FieldName::new("amount");
        Ok(Self {
            employee_id: parse_uuid(&require(body.employee_id, employee)?, employee)?,
            description: require(body.description, FieldName::new("description"))?,
            amount: parse_decimal(&require(body.amount, amount)?, amount)?,
            effective_date: parse_optional_date(
                body.effective_date.as_deref(),
                FieldName::new("effectiveDate"),
            )?,
        })
    }
}

/// Aggregated totals for a period.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    #[schema(example = "1200.00")]
    pub total_gross: String,
    #[schema(example = "100.00")]
    pub total_deductions: String,
    #[schema(example = "1100.00")]
    pub total_net: String,
    pub employee_count: usize,
    /// Occurrences per warning code.
    pub warnings: BTreeMap<String, usize>,
}

impl From<PayrollSummary> for SummaryBody {
    fn from(summary: PayrollSummary) -> Self {
        Self {
            total_gross: summary.total_gross.to_string(),
            total_deductions: summary.total_deductions.to_string(),
            total_net: summary.total_net.to_string(),
            employee_count: summary.employee_count,
            warnings: summary
                .warnings
                .into_iter()
                .map(|(code, count)| (code.as_str().to_owned(), count))
                .collect(),
        }
    }
}
