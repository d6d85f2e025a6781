//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{
    employees, idempotency_keys, leave_requests, pay_elements, pay_periods, payroll_adjustments,
    payroll_inputs, payroll_results, payroll_run_failures, payslips,
};

// ---------------------------------------------------------------------------
// HR core read models
// ---------------------------------------------------------------------------

/// Payroll-relevant columns of an employee.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = employees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EmployeeProfileRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub base_salary: Option<Decimal>,
    pub currency: Option<String>,
    pub bank_account: Option<String>,
}

/// Date range of one leave request.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = leave_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LeaveSpanRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_half: bool,
    pub end_half: bool,
}

// ---------------------------------------------------------------------------
// Pay period models
// ---------------------------------------------------------------------------

/// Row struct for reading from the pay_periods table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pay_periods)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayPeriodRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub schedule_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub finalized_at: Option<DateTime<Utc>>,
}

/// Insertable struct for new pay periods.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pay_periods)]
pub(crate) struct NewPayPeriodRow<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub schedule_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: &'a str,
}

// ---------------------------------------------------------------------------
// Catalog and input models
// ---------------------------------------------------------------------------

/// Row struct for reading and inserting pay elements.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = pay_elements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayElementRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub element_type: String,
    pub calc_type: String,
    pub default_amount: Decimal,
    pub taxable: bool,
}

/// Insertable struct for input lines.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payroll_inputs)]
pub(crate) struct NewPayrollInputRow<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub element_id: Uuid,
    pub units: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub source: &'a str,
}

/// Row struct for reading and inserting adjustments.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payroll_adjustments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayrollAdjustmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub effective_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Result models
// ---------------------------------------------------------------------------

/// Row struct for reading payroll results.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payroll_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayrollResultRow {
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub gross: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
    pub currency: String,
    pub warnings: Vec<String>,
}

/// Insertable struct for result upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payroll_results)]
pub(crate) struct NewPayrollResultRow<'a> {
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub gross: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
    pub currency: &'a str,
    pub warnings: Vec<String>,
}

/// Row struct for reading and inserting run failures.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payroll_run_failures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayrollRunFailureRow {
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub code: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Payslip models
// ---------------------------------------------------------------------------

/// Row struct for reading and inserting payslips.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payslips)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PayslipRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period_id: Uuid,
    pub employee_id: Uuid,
    pub file_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Idempotency key models
// ---------------------------------------------------------------------------

/// Row struct for reading from the idempotency_keys table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyKeyRow {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub endpoint: String,
    pub request_hash: Vec<u8>,
    pub cached_response: Option<serde_json::Value>,
    pub expires_at: DateTime<Utc>,
}

/// Insertable struct for idempotency claims.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = idempotency_keys)]
pub(crate) struct NewIdempotencyKeyRow<'a> {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub key: &'a str,
    pub endpoint: &'a str,
    pub request_hash: &'a [u8],
    pub cached_response: Option<&'a serde_json::Value>,
    pub expires_at: DateTime<Utc>,
}
