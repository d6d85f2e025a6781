//! Payroll domain: periods, catalog, inputs, calculation and exports.
//!
//! Everything here is pure. Persistence and side effects live behind the
//! ports in [`crate::domain::ports`].

mod calculator;
mod csv_import;
mod element;
mod employee;
mod export;
mod input;
mod leave;
mod payslip;
mod period;
mod result;
mod warning;

use rust_decimal::{Decimal, RoundingStrategy};

pub use calculator::{
    CalculationInput, NET_VARIANCE_THRESHOLD, PayrollComputation, calculate, daily_rate,
    derive_warnings,
};
pub use csv_import::{
    CsvImportError, EmployeeLocator, ImportRow, ParsedImport, RowRejection, parse_input_csv,
};
pub use element::{
    CalcType, ELEMENT_NAME_MAX, ElementType, ParseCatalogValueError, PayElement, PayElementDraft,
    PayElementValidationError,
};
pub use employee::{DEFAULT_CURRENCY, EmployeePayProfile};
pub use export::{ExportError, JournalAccount, write_journal_csv, write_register_csv};
pub use input::{
    AdjustmentDraft, ClassifiedInput, InputSource, InputValidationError, PayrollAdjustment,
    PayrollInput, PayrollInputDraft, normalise_amount,
};
pub use leave::{LeaveWindow, LeaveWindowError, UnpaidLeaveSpan};
pub use payslip::{Payslip, PayslipFilter, PayslipRenderPayload};
pub use period::{
    InvalidTransition, ParsePeriodStatusError, PayPeriod, PeriodAction, PeriodBounds,
    PeriodStatus, PeriodValidationError,
};
pub use result::{PayrollResult, PayrollRunFailure, PayrollSummary, RegisterLine};
pub use warning::{ParseWarningCodeError, WarningCode};

/// Round a monetary value to cents, half away from zero.
///
/// # Examples
/// ```
/// use payroll::domain::payroll::round_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_money(dec!(2.005)), dec!(2.01));
/// assert_eq!(round_money(dec!(-2.005)), dec!(-2.01));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
