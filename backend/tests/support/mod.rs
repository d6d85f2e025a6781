//! Shared builders for payroll integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use payroll::domain::payroll::{
    CalcType, ElementType, EmployeePayProfile, InputSource, PayElementDraft, PayrollInputDraft,
};
use payroll::domain::ports::{CreatePeriodRequest, PayrollInputCommand, PayrollPeriodCommand};
use payroll::domain::{ActorContext, PayrollInputService, PayrollPeriodService, TenantId, UserId};
use payroll::test_support::PayrollHarness;
use rust_decimal::Decimal;
use uuid::Uuid;

pub const TENANT_ID: &str = "00000000-0000-0000-0000-0000000000a1";
pub const USER_ID: &str = "00000000-0000-0000-0000-0000000000b1";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, day).expect("valid date")
}

pub fn actor() -> ActorContext {
    ActorContext::new(
        TenantId::new(TENANT_ID).expect("tenant id"),
        UserId::new(USER_ID).expect("user id"),
    )
}

pub fn profile(
    email: &str,
    base_salary: Option<Decimal>,
    has_bank_account: bool,
) -> EmployeePayProfile {
    EmployeePayProfile {
        employee_id: Uuid::new_v4(),
        first_name: "Grace".to_owned(),
        last_name: "Hopper".to_owned(),
        email: email.to_owned(),
        base_salary,
        currency: "USD".to_owned(),
        has_bank_account,
    }
}

/// Seed one employee and return their identifier.
pub fn seed_employee(harness: &PayrollHarness, profile: EmployeePayProfile) -> Uuid {
    let employee_id = profile.employee_id;
    harness.store.seed_employee(actor().tenant_id(), profile);
    employee_id
}

/// Open a June 2026 draft period.
pub async fn open_june(periods: &PayrollPeriodService) -> Uuid {
    periods
        .create_period(
            &actor(),
            CreatePeriodRequest {
                schedule_id: Uuid::new_v4(),
                start_date: june(1),
                end_date: june(30),
            },
        )
        .await
        .expect("period created")
        .id
}

/// Define a fixed-amount catalog element.
pub async fn element(inputs: &PayrollInputService, name: &str, element_type: ElementType) -> Uuid {
    inputs
        .create_element(
            &actor(),
            PayElementDraft {
                name: name.to_owned(),
                element_type,
                calc_type: CalcType::Fixed,
                default_amount: Decimal::ZERO,
                taxable: element_type == ElementType::Earning,
            },
        )
        .await
        .expect("element created")
        .id
}

/// Record a flat amount for one employee.
pub async fn flat_input(
    inputs: &PayrollInputService,
    period_id: Uuid,
    employee_id: Uuid,
    element_id: Uuid,
    amount: Decimal,
) {
    inputs
        .add_input(
            &actor(),
            period_id,
            PayrollInputDraft {
                employee_id,
                element_id,
                units: Decimal::ZERO,
                rate: Decimal::ZERO,
                amount,
                source: InputSource::Manual,
            },
        )
        .await
        .expect("input recorded");
}
