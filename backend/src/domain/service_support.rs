//! Port error to domain error mapping shared by the payroll services.
//!
//! Connection failures surface as `service_unavailable`; everything else a
//! repository reports is an `internal_error` whose message is redacted at the
//! HTTP boundary.

use serde_json::json;
use uuid::Uuid;

use crate::domain::payroll::{InvalidTransition, PayPeriod};
use crate::domain::ports::{
    EmployeeDirectoryError, IdempotencyRepositoryError, PayPeriodRepository,
    PayPeriodRepositoryError, PayrollInputRepositoryError, PayrollResultRepositoryError,
    PayslipRendererError, PayslipRepositoryError,
};
use crate::domain::{ActorContext, Error};

macro_rules! map_repository_error {
    ($fn_name:ident, $error:ident, $label:literal) => {
        pub(crate) fn $fn_name(error: $error) -> Error {
            match error {
                $error::Connection { message } => {
                    Error::service_unavailable(format!(concat!($label, " unavailable: {}"), message))
                }
                $error::Query { message } => {
                    Error::internal(format!(concat!($label, " error: {}"), message))
                }
            }
        }
    };
}

map_repository_error!(map_period_error, PayPeriodRepositoryError, "pay period repository");
map_repository_error!(map_result_error, PayrollResultRepositoryError, "payroll result repository");
map_repository_error!(map_input_error, PayrollInputRepositoryError, "payroll input repository");
map_repository_error!(map_directory_error, EmployeeDirectoryError, "employee directory");
map_repository_error!(map_payslip_error, PayslipRepositoryError, "payslip repository");

pub(crate) fn map_idempotency_error(error: IdempotencyRepositoryError) -> Error {
    match error {
        IdempotencyRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("idempotency repository unavailable: {message}"))
        }
        IdempotencyRepositoryError::Query { message } => {
            Error::internal(format!("idempotency repository error: {message}"))
        }
        IdempotencyRepositoryError::Serialization { message } => Error::internal(format!(
            "idempotency repository serialization failed: {message}"
        )),
        IdempotencyRepositoryError::DuplicateKey { message } => {
            Error::internal(format!("unexpected idempotency key conflict: {message}"))
        }
    }
}

pub(crate) fn map_renderer_error(error: PayslipRendererError) -> Error {
    match error {
        PayslipRendererError::Unavailable { message } => {
            Error::service_unavailable(format!("payslip renderer unavailable: {message}"))
        }
        PayslipRendererError::Rejected { message } => {
            Error::internal(format!("payslip renderer rejected request: {message}"))
        }
    }
}

/// Domain error for a rejected lifecycle action.
pub(crate) fn invalid_transition_error(error: InvalidTransition) -> Error {
    Error::invalid_state_transition(error.to_string()).with_details(json!({
        "status": error.from.as_str(),
        "action": error.action.as_str(),
    }))
}

/// Validation error pointing at one request field.
pub(crate) fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

/// Load a tenant's period or fail with `not_found`.
pub(crate) async fn load_period(
    periods: &dyn PayPeriodRepository,
    actor: &ActorContext,
    period_id: Uuid,
) -> Result<PayPeriod, Error> {
    periods
        .find_by_id(actor.tenant_id(), period_id)
        .await
        .map_err(map_period_error)?
        .ok_or_else(|| Error::not_found(format!("pay period {period_id} not found")))
}
