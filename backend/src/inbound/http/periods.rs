//! Pay period HTTP handlers.
//!
//! ```text
//! POST   /api/v1/payroll/periods
//! GET    /api/v1/payroll/periods/{period_id}
//! POST   /api/v1/payroll/periods/{period_id}/run
//! POST   /api/v1/payroll/periods/{period_id}/finalize
//! POST   /api/v1/payroll/periods/{period_id}/reopen
//! POST   /api/v1/payroll/periods/{period_id}/inputs
//! POST   /api/v1/payroll/periods/{period_id}/inputs/import
//! POST   /api/v1/payroll/periods/{period_id}/adjustments
//! DELETE /api/v1/payroll/periods/{period_id}/adjustments/{adjustment_id}
//! GET    /api/v1/payroll/periods/{period_id}/export/register
//! GET    /api/v1/payroll/periods/{period_id}/export/journal
//! GET    /api/v1/payroll/periods/{period_id}/summary
//! ```

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::payroll::{AdjustmentDraft, PayrollInputDraft};
use crate::domain::ports::{CreatePeriodRequest, FinalizePeriodRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::actor::Actor;
use crate::inbound::http::idempotency::{IDEMPOTENT_REPLAYED_HEADER, extract_idempotency_key};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

#[path = "periods_dto.rs"]
mod dto;

pub use dto::{
    AdjustmentBody, CreatePeriodBody, CreatedBody, ImportBody, InputBody, PeriodBody,
    PeriodStatusBody, ReopenBody, SummaryBody,
};
use dto::{AdjustmentPath, PeriodPath, parse_period_id};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

fn csv_attachment(body: String, filename: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(CSV_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(body)
}

/// Open a draft pay period.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods",
    request_body = CreatePeriodBody,
    responses(
        (status = 201, description = "Period created", body = CreatedBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["periods"],
    operation_id = "createPayPeriod"
)]
#[post("/payroll/periods")]
pub async fn create_period(
    state: web::Data<HttpState>,
    actor: Actor,
    payload: web::Json<CreatePeriodBody>,
) -> ApiResult<HttpResponse> {
    let request = CreatePeriodRequest::try_from(payload.into_inner())?;
    let created = state
        .periods
        .create_period(actor.context(), request)
        .await?;
    Ok(HttpResponse::Created().json(CreatedBody::from(created.id)))
}

/// Fetch one pay period.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{period_id}",
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Pay period", body = PeriodBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["periods"],
    operation_id = "getPayPeriod"
)]
#[get("/payroll/periods/{period_id}")]
pub async fn get_period(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
) -> ApiResult<web::Json<PeriodBody>> {
    let period_id = parse_period_id(&path.period_id)?;
    let period = state
        .period_queries
        .get_period(actor.context(), period_id)
        .await?;
    Ok(web::Json(PeriodBody::from(period)))
}

/// Calculate every active employee and move the period to `reviewed`.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/run",
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Period calculated", body = PeriodStatusBody),
        (status = 400, description = "Invalid state transition", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["periods"],
    operation_id = "runPayPeriod"
)]
#[post("/payroll/periods/{period_id}/run")]
pub async fn run_period(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
) -> ApiResult<web::Json<PeriodStatusBody>> {
    let period_id = parse_period_id(&path.period_id)?;
    let response = state.periods.run_period(actor.context(), period_id).await?;
    Ok(web::Json(PeriodStatusBody {
        status: response.status,
    }))
}

/// Freeze a reviewed period and create its payslips.
///
/// Retries carrying the same `Idempotency-Key` replay the first response
/// and set `Idempotent-Replayed: true`.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/finalize",
    params(
        ("period_id" = String, Path, description = "Pay period identifier"),
        ("Idempotency-Key" = Option<String>, Header, description = "Opaque key for safe retries")
    ),
    responses(
        (status = 200, description = "Period finalized", body = PeriodStatusBody),
        (status = 400, description = "Invalid state transition", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Key reused with a different request", body = Error),
        (status = 503, description = "Original request still in progress", body = Error)
    ),
    tags = ["periods"],
    operation_id = "finalizePayPeriod"
)]
#[post("/payroll/periods/{period_id}/finalize")]
pub async fn finalize_period(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
    request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let period_id = parse_period_id(&path.period_id)?;
    let idempotency_key = extract_idempotency_key(request.headers())?;
    let outcome = state
        .periods
        .finalize_period(
            actor.context(),
            FinalizePeriodRequest {
                period_id,
                idempotency_key,
            },
        )
        .await?;

    let mut response = HttpResponse::Ok();
    if outcome.replayed {
        response.insert_header((IDEMPOTENT_REPLAYED_HEADER, "true"));
    }
    Ok(response.json(PeriodStatusBody {
        status: outcome.response.status,
    }))
}

/// Return a finalized period to `draft`, discarding results and payslips.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/reopen",
    request_body = ReopenBody,
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Period reopened", body = PeriodStatusBody),
        (status = 400, description = "Invalid request or state transition", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["periods"],
    operation_id = "reopenPayPeriod"
)]
#[post("/payroll/periods/{period_id}/reopen")]
pub async fn reopen_period(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
    payload: web::Json<ReopenBody>,
) -> ApiResult<web::Json<PeriodStatusBody>> {
    let period_id = parse_period_id(&path.period_id)?;
    let reason = payload.into_inner().reason.unwrap_or_default();
    let response = state
        .periods
        .reopen_period(actor.context(), period_id, reason)
        .await?;
    Ok(web::Json(PeriodStatusBody {
        status: response.status,
    }))
}

/// Append one input line.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/inputs",
    request_body = InputBody,
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 201, description = "Input recorded", body = CreatedBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Period, employee or element not found", body = Error)
    ),
    tags = ["inputs"],
    operation_id = "addPayrollInput"
)]
#[post("/payroll/periods/{period_id}/inputs")]
pub async fn add_input(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
    payload: web::Json<InputBody>,
) -> ApiResult<HttpResponse> {
    let period_id = parse_period_id(&path.period_id)?;
    let draft = PayrollInputDraft::try_from(payload.into_inner())?;
    let id = state
        .inputs
        .add_input(actor.context(), period_id, draft)
        .await?;
    Ok(HttpResponse::Created().json(CreatedBody::from(id)))
}

/// Append input lines from a CSV upload.
///
/// Columns are `employee_id` or `email`, `element_id` or `element_name`,
/// then `units`, `rate` and `amount`. Rows whose employee or element cannot
/// be resolved are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/inputs/import",
    request_body(content = String, content_type = "text/csv"),
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Rows imported", body = ImportBody),
        (status = 400, description = "Malformed CSV", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inputs"],
    operation_id = "importPayrollInputs"
)]
#[post("/payroll/periods/{period_id}/inputs/import")]
pub async fn import_inputs(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
    body: String,
) -> ApiResult<web::Json<ImportBody>> {
    let period_id = parse_period_id(&path.period_id)?;
    let outcome = state
        .inputs
        .import_inputs(actor.context(), period_id, body)
        .await?;
    Ok(web::Json(ImportBody {
        imported: outcome.imported,
        skipped: outcome.skipped,
    }))
}

/// Record an adjustment against one employee.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{period_id}/adjustments",
    request_body = AdjustmentBody,
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 201, description = "Adjustment recorded", body = CreatedBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Period or employee not found", body = Error)
    ),
    tags = ["inputs"],
    operation_id = "addPayrollAdjustment"
)]
#[post("/payroll/periods/{period_id}/adjustments")]
pub async fn add_adjustment(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
    payload: web::Json<AdjustmentBody>,
) -> ApiResult<HttpResponse> {
    let period_id = parse_period_id(&path.period_id)?;
    let draft = AdjustmentDraft::try_from(payload.into_inner())?;
    let id = state
        .inputs
        .add_adjustment(actor.context(), period_id, draft)
        .await?;
    Ok(HttpResponse::Created().json(CreatedBody::from(id)))
}

/// Remove an adjustment.
#[utoipa::path(
    delete,
    path = "/api/v1/payroll/periods/{period_id}/adjustments/{adjustment_id}",
    params(
        ("period_id" = String, Path, description = "Pay period identifier"),
        ("adjustment_id" = String, Path, description = "Adjustment identifier")
    ),
    responses(
        (status = 204, description = "Adjustment removed"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inputs"],
    operation_id = "deletePayrollAdjustment"
)]
#[delete("/payroll/periods/{period_id}/adjustments/{adjustment_id}")]
pub async fn delete_adjustment(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<AdjustmentPath>,
) -> ApiResult<HttpResponse> {
    let AdjustmentPath {
        period_id,
        adjustment_id,
    } = path.into_inner();
    let period_id = parse_period_id(&period_id)?;
    let adjustment_id = parse_uuid(&adjustment_id, FieldName::new("adjustmentId"))?;
    state
        .inputs
        .delete_adjustment(actor.context(), period_id, adjustment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

fn export_filename(kind: &str, period_id: Uuid) -> String {
    format!("{kind}-{period_id}.csv")
}

/// Download the payroll register as CSV.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{period_id}/export/register",
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Register CSV", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["exports"],
    operation_id = "exportPayrollRegister"
)]
#[get("/payroll/periods/{period_id}/export/register")]
pub async fn export_register(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
) -> ApiResult<HttpResponse> {
    let period_id = parse_period_id(&path.period_id)?;
    let csv = state
        .period_queries
        .export_register(actor.context(), period_id)
        .await?;
    Ok(csv_attachment(csv, export_filename("register", period_id)))
}

/// Download the balanced journal as CSV.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{period_id}/export/journal",
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Journal CSV", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["exports"],
    operation_id = "exportPayrollJournal"
)]
#[get("/payroll/periods/{period_id}/export/journal")]
pub async fn export_journal(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
) -> ApiResult<HttpResponse> {
    let period_id = parse_period_id(&path.period_id)?;
    let csv = state
        .period_queries
        .export_journal(actor.context(), period_id)
        .await?;
    Ok(csv_attachment(csv, export_filename("journal", period_id)))
}

/// Totals and warning counts for a period.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{period_id}/summary",
    params(("period_id" = String, Path, description = "Pay period identifier")),
    responses(
        (status = 200, description = "Period summary", body = SummaryBody),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["exports"],
    operation_id = "getPayrollSummary"
)]
#[get("/payroll/periods/{period_id}/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    actor: Actor,
    path: web::Path<PeriodPath>,
) -> ApiResult<web::Json<SummaryBody>> {
    let period_id = parse_period_id(&path.period_id)?;
    let summary = state
        .period_queries
        .summary(actor.context(), period_id)
        .await?;
    Ok(web::Json(SummaryBody::from(summary)))
}

#[cfg(test)]
#[path = "periods_tests.rs"]
mod tests;
