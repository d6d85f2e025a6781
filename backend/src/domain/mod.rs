//! Domain primitives, ports and services.
//!
//! Purpose: model payroll periods and their calculation independently of
//! transport and storage. Inbound adapters call the driving ports in
//! [`ports`]; outbound adapters implement the driven ones.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - ActorContext — acting tenant and user passed to every service call.
//! - PayrollPeriodService, PayrollInputService, PayslipService — driving
//!   port implementations.

pub mod error;
pub mod idempotency;
pub mod idempotency_guard;
pub mod identity;
pub mod payroll;
pub mod payroll_input_service;
pub mod payroll_period_service;
pub mod payslip_materializer;
pub mod payslip_service;
pub mod ports;
pub(crate) mod service_support;
pub mod side_effect;
pub mod trace_id;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::idempotency_guard::{Guarded, GuardedRequest, IdempotencyGuard};
pub use self::identity::{ActorContext, IdentityValidationError, TenantId, UserId};
pub use self::payroll_input_service::PayrollInputService;
pub use self::payroll_period_service::{
    PayrollCollaborators, PayrollPeriodService, PayrollRepositories,
};
pub use self::payslip_materializer::PayslipMaterializer;
pub use self::payslip_service::PayslipService;
pub use self::side_effect::{SideEffect, log_side_effect_failure};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use payroll::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("pay period not found"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
