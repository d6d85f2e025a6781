//! Pure payroll calculation for one employee in one period.
//!
//! ```text
//! gross      = base + earnings + adjustments - unpaid leave
//! deductions = sum of deduction lines
//! net        = gross - deductions
//! ```
//!
//! Totals are rounded to cents once, after aggregation.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::element::ElementType;
use super::input::{ClassifiedInput, PayrollAdjustment};
use super::leave::LeaveWindow;
use super::period::PeriodBounds;
use super::round_money;
use super::warning::WarningCode;

/// Relative change in net pay above which `net_variance` is raised.
pub const NET_VARIANCE_THRESHOLD: Decimal = dec!(0.5);

/// Everything the calculator needs for one employee.
#[derive(Debug, Clone, Copy)]
pub struct CalculationInput<'a> {
    /// Period being calculated.
    pub bounds: &'a PeriodBounds,
    /// Base salary for the period.
    pub base_salary: Decimal,
    /// Input lines joined to their element type.
    pub inputs: &'a [ClassifiedInput],
    /// Approved unpaid leave overlapping the period.
    pub leave_windows: &'a [LeaveWindow],
    /// Adjustments recorded against the period; out-of-period ones are ignored.
    pub adjustments: &'a [PayrollAdjustment],
    /// Net of the latest earlier finalized result, if any.
    pub previous_net: Option<Decimal>,
    /// Whether the employee has a bank account on file.
    pub has_bank_account: bool,
}

/// Calculated monetary result and its warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollComputation {
    /// Gross pay after adjustments and unpaid leave.
    pub gross: Decimal,
    /// Sum of deductions.
    pub deductions: Decimal,
    /// Gross minus deductions.
    pub net: Decimal,
    /// Amount removed for unpaid leave.
    pub unpaid_leave_deduction: Decimal,
    /// Sum of in-period adjustments.
    pub adjustment_total: Decimal,
    /// Anomaly flags.
    pub warnings: BTreeSet<WarningCode>,
}

/// Salary earned per calendar day of the period.
pub fn daily_rate(base_salary: Decimal, bounds: &PeriodBounds) -> Decimal {
    base_salary / Decimal::from(bounds.days())
}

/// Calculate one employee's result.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use payroll::domain::payroll::{
///     CalculationInput, ClassifiedInput, ElementType, PeriodBounds, WarningCode, calculate,
/// };
/// use rust_decimal_macros::dec;
///
/// let day = |d| NaiveDate::from_ymd_opt(2026, 6, d).unwrap();
/// let bounds = PeriodBounds::new(day(1), day(30)).unwrap();
/// let inputs = [
///     ClassifiedInput { element_type: Some(ElementType::Earning), amount: dec!(200) },
///     ClassifiedInput { element_type: Some(ElementType::Deduction), amount: dec!(100) },
/// ];
/// let result = calculate(&CalculationInput {
///     bounds: &bounds,
///     base_salary: dec!(1000),
///     inputs: &inputs,
///     leave_windows: &[],
///     adjustments: &[],
///     previous_net: None,
///     has_bank_account: false,
/// });
/// assert_eq!((result.gross, result.deductions, result.net), (dec!(1200), dec!(100), dec!(1100)));
/// assert!(result.warnings.contains(&WarningCode::MissingBankAccount));
/// ```
pub fn calculate(input: &CalculationInput<'_>) -> PayrollComputation {
    let earnings = sum_of(input.inputs, ElementType::Earning);
    let deductions = sum_of(input.inputs, ElementType::Deduction);

    let rate = daily_rate(input.base_salary, input.bounds);
    let unpaid_days: Decimal = input
        .leave_windows
        .iter()
        .map(|window| window.covered_days(input.bounds))
        .sum();
    let unpaid_leave_deduction = rate * unpaid_days;

    let adjustment_total: Decimal = input
        .adjustments
        .iter()
        .filter(|adjustment| adjustment.applies_to(input.bounds))
        .map(|adjustment| adjustment.amount)
        .sum();

    let gross = round_money(input.base_salary + earnings + adjustment_total - unpaid_leave_deduction);
    let deductions = round_money(deductions);
    let net = gross - deductions;

    PayrollComputation {
        gross,
        deductions,
        net,
        unpaid_leave_deduction: round_money(unpaid_leave_deduction),
        adjustment_total: round_money(adjustment_total),
        warnings: derive_warnings(net, input.previous_net, input.has_bank_account),
    }
}

fn sum_of(inputs: &[ClassifiedInput], element_type: ElementType) -> Decimal {
    inputs
        .iter()
        .filter(|line| line.element_type == Some(element_type))
        .map(|line| line.amount)
        .sum()
}

/// Derive the independent warning flags for a calculated net.
pub fn derive_warnings(
    net: Decimal,
    previous_net: Option<Decimal>,
    has_bank_account: bool,
) -> BTreeSet<WarningCode> {
    let mut warnings = BTreeSet::new();
    if !has_bank_account {
        warnings.insert(WarningCode::MissingBankAccount);
    }
    if net < Decimal::ZERO {
        warnings.insert(WarningCode::NegativeNet);
    }
    if let Some(previous) = previous_net.filter(|previous| !previous.is_zero()) {
        let variance = (net - previous).abs() / previous.abs();
        if variance > NET_VARIANCE_THRESHOLD {
            warnings.insert(WarningCode::NetVariance);
        }
    }
    warnings
}
