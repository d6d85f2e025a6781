//! Payslip HTTP handlers.
//!
//! ```text
//! GET  /api/v1/payroll/payslips?periodId=&employeeId=
//! POST /api/v1/payroll/payslips
//! GET  /api/v1/payroll/payslips/{payslip_id}/download
//! POST /api/v1/payroll/payslips/{payslip_id}/regenerate
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::domain::payroll::{Payslip, PayslipFilter};
use crate::domain::ports::{GeneratePayslipsResponse, PayslipDownload};
use crate::inbound::http::ApiResult;
use crate::inbound::http::actor::Actor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_uuid, parse_uuid, require};

#[derive(Debug, Deserialize)]
struct PayslipPath {
    payslip_id: String,
}

/// Optional listing filters.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PayslipQuery {
    /// Restrict to one period.
    #[param(format = "uuid")]
    pub period_id: Option<String>,
    /// Restrict to one employee.
    #[param(format = "uuid")]
    pub employee_id: Option<String>,
}

impl TryFrom<PayslipQuery> for PayslipFilter {
    type Error = Error;

    fn try_from(query: PayslipQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            period_id: parse_optional_uuid(query.period_id.as_deref(), FieldName::new("periodId"))?,
            employee_id: parse_optional_uuid(
                query.employee_id.as_deref(),
                FieldName::new("employeeId"),
            )?,
        })
    }
}

/// Payslip row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayslipResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub period_id: String,
    #[schema(format = "uuid")]
    pub employee_id: String,
    pub file_ref: Option<String>,
    #[schema(format = "date-time")]
    pub created_at: String,
}

impl From<Payslip> for PayslipResponse {
    fn from(payslip: Payslip) -> Self {
        Self {
            id: payslip.id.to_string(),
            period_id: payslip.period_id.to_string(),
            employee_id: payslip.employee_id.to_string(),
            file_ref: payslip.file_ref,
            created_at: payslip.created_at.to_rfc3339(),
        }
    }
}

/// Request payload for generating a period's payslips.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[schema(format = "uuid")]
    pub period_id: Option<String>,
}

/// Counts from a generation pass.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub created: usize,
    pub rendered: usize,
}

impl From<GeneratePayslipsResponse> for GenerateResponse {
    fn from(value: GeneratePayslipsResponse) -> Self {
        Self {
            created: value.created,
            rendered: value.rendered,
        }
    }
}

/// Rendered document reference.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    #[schema(format = "uuid")]
    pub payslip_id: String,
    #[schema(example = "payslips/2026-06/3fa85f64.pdf")]
    pub file_ref: String,
}

impl From<PayslipDownload> for DownloadResponse {
    fn from(value: PayslipDownload) -> Self {
        Self {
            payslip_id: value.payslip_id.to_string(),
            file_ref: value.file_ref,
        }
    }
}

fn parse_payslip_id(path: &PayslipPath) -> Result<uuid::Uuid, Error> {
    parse_uuid(&path.payslip_id, FieldName::new("payslipId"))
}

/// List payslips, optionally filtered by period and employee.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/payslips",
    params(PayslipQuery),
    responses(
        (status = 200, description = "Payslips", body = [PayslipResponse]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["payslips"],
    operation_id = "listPayslips"
)]
#[get("/payroll/payslips")]
pub async fn list_payslips(
    state: web::Data<HttpState>,
    actor: Actor,
    query: web::Query<PayslipQuery>,
) -> ApiResult<web::Json<Vec<PayslipResponse>>> {
    let filter = PayslipFilter::try_from(query.into_inner())?;
    let payslips = state.payslips.list_payslips(actor.context(), filter).await?;
    Ok(web::Json(
        payslips.into_iter().map(PayslipResponse::from).collect(),
    ))
}

/// Create missing payslips for a finalized period and render their
/// documents.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/payslips",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Payslips generated", body = GenerateResponse),
        (status = 400, description = "Period is not finalized", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["payslips"],
    operation_id = "generatePayslips"
)]
#[post("/payroll/payslips")]
pub async fn generate_payslips(
    state: web::Data<HttpState>,
    actor: Actor,
    payload: web::Json<GenerateRequest>,
) -> ApiResult<web::Json<GenerateResponse>> {
    let field = FieldName::new("periodId");
    let period_id = parse_uuid(&require(payload.into_inner().period_id, field)?, field)?;
    let response = state
        .payslips
        .generate_payslips(actor.context(), period_id)
        .await?;
    Ok(web::Json(GenerateResponse::from(response)))
}

/// Document reference, rendering it on first access.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/payslips/{payslip_id}/download",
    params(("payslip_id" = String, Path, description = "Payslip identifier")),
    responses(
        (status = 200, description = "Document reference", body = DownloadResponse),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Renderer unavailable", body = Error)
    ),
    tags = ["payslips"],
    operation_id = "downloadPayslip"
)]
#[get("/payroll/payslips/{payslip_id}/download")]
pub async fn download_payslip(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PayslipPath>,
) -> ApiResult<web::Json<DownloadResponse>> {
    let payslip_id = parse_payslip_id(&path)?;
    let download = state.payslips.download(actor.context(), payslip_id).await?;
    Ok(web::Json(DownloadResponse::from(download)))
}

/// Re-render a payslip and replace its document reference.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/payslips/{payslip_id}/regenerate",
    params(("payslip_id" = String, Path, description = "Payslip identifier")),
    responses(
        (status = 200, description = "Document re-rendered", body = DownloadResponse),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Renderer unavailable", body = Error)
    ),
    tags = ["payslips"],
    operation_id = "regeneratePayslip"
)]
#[post("/payroll/payslips/{payslip_id}/regenerate")]
pub async fn regenerate_payslip(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PayslipPath>,
) -> ApiResult<web::Json<DownloadResponse>> {
    let payslip_id = parse_payslip_id(&path)?;
    let download = state
        .payslips
        .regenerate(actor.context(), payslip_id)
        .await?;
    Ok(web::Json(DownloadResponse::from(download)))
}

#[cfg(test)]
#[path = "payslips_tests.rs"]
mod tests;
