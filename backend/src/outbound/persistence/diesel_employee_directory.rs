//! Read-only Diesel adapters onto HR core tables.
//!
//! Payroll never writes `employees`, `leave_types` or `leave_requests`; both
//! `EmployeeDirectory` and `LeaveRepository` are implemented by one adapter
//! because they share the pool and error mapping.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{
    DEFAULT_CURRENCY, EmployeePayProfile, PeriodBounds, UnpaidLeaveSpan,
};
use crate::domain::ports::{EmployeeDirectory, EmployeeDirectoryError, LeaveRepository};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{EmployeeProfileRow, LeaveSpanRow};
use super::pool::{DbPool, PoolError};
use super::schema::{employees, leave_requests, leave_types};

diesel::define_sql_function! {
    /// PostgreSQL `LOWER`, matching the case-insensitive email index.
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

const ACTIVE: &str = "active";
const APPROVED: &str = "approved";

/// Diesel-backed implementation of [`EmployeeDirectory`] and
/// [`LeaveRepository`].
#[derive(Clone)]
pub struct DieselEmployeeDirectory {
    pool: DbPool,
}

impl DieselEmployeeDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EmployeeDirectoryError {
    map_pool_failure(error)
}

fn map_diesel_error(error: diesel::result::Error) -> EmployeeDirectoryError {
    map_diesel_failure(error, "employees")
}

fn row_to_profile(row: EmployeeProfileRow) -> EmployeePayProfile {
    let has_bank_account = row
        .bank_account
        .as_deref()
        .is_some_and(|account| !account.trim().is_empty());
    EmployeePayProfile {
        employee_id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        base_salary: row.base_salary,
        currency: row
            .currency
            .filter(|currency| !currency.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        has_bank_account,
    }
}

#[async_trait]
impl EmployeeDirectory for DieselEmployeeDirectory {
    async fn list_active_profiles(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<EmployeePayProfile>, EmployeeDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<EmployeeProfileRow> = employees::table
            .filter(employees::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(employees::status.eq(ACTIVE))
            .order_by((employees::last_name, employees::first_name, employees::id))
            .select(EmployeeProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn find_employee_id_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<Uuid>, EmployeeDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        employees::table
            .filter(employees::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(lower(employees::email).eq(email.to_lowercase()))
            .select(employees::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn employee_exists(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
    ) -> Result<bool, EmployeeDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            employees::table
                .filter(employees::tenant_id.eq(*tenant_id.as_uuid()))
                .filter(employees::id.eq(employee_id)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}

#[async_trait]
impl LeaveRepository for DieselEmployeeDirectory {
    async fn unpaid_leave_overlapping(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        bounds: &PeriodBounds,
    ) -> Result<Vec<UnpaidLeaveSpan>, EmployeeDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<LeaveSpanRow> = leave_requests::table
            .inner_join(leave_types::table)
            .filter(leave_requests::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(leave_requests::employee_id.eq(employee_id))
            .filter(leave_requests::status.eq(APPROVED))
            .filter(leave_types::paid.eq(false))
            .filter(leave_requests::start_date.le(bounds.end()))
            .filter(leave_requests::end_date.ge(bounds.start()))
            .order_by(leave_requests::start_date)
            .select(LeaveSpanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UnpaidLeaveSpan {
                start_date: row.start_date,
                end_date: row.end_date,
                start_half: row.start_half,
                end_half: row.end_half,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    use super::*;

    #[fixture]
    fn row() -> EmployeeProfileRow {
        EmployeeProfileRow {
            id: Uuid::new_v4(),
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            email: "grace@example.com".to_owned(),
            base_salary: Some(dec!(4000)),
            currency: Some("EUR".to_owned()),
            bank_account: Some("DE89370400440532013000".to_owned()),
        }
    }

    #[rstest]
    fn profile_keeps_pay_group_currency(row: EmployeeProfileRow) {
        let profile = row_to_profile(row);

        assert_eq!(profile.currency, "EUR");
        assert!(profile.has_bank_account);
        assert_eq!(profile.base_salary, Some(dec!(4000)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    fn missing_currency_defaults(row: EmployeeProfileRow, #[case] currency: Option<String>) {
        let profile = row_to_profile(EmployeeProfileRow { currency, ..row });

        assert_eq!(profile.currency, DEFAULT_CURRENCY);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("  ".to_owned()))]
    fn blank_bank_account_counts_as_missing(
        row: EmployeeProfileRow,
        #[case] bank_account: Option<String>,
    ) {
        let profile = row_to_profile(EmployeeProfileRow { bank_account, ..row });

        assert!(!profile.has_bank_account);
    }
}
