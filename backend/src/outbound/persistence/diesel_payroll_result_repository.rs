//! PostgreSQL-backed `PayrollResultRepository` implementation.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{
    PayrollResult, PayrollRunFailure, PeriodStatus, RegisterLine, WarningCode,
};
use crate::domain::ports::{PayrollResultRepository, PayrollResultRepositoryError};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{NewPayrollResultRow, PayrollResultRow, PayrollRunFailureRow};
use super::pool::{DbPool, PoolError};
use super::schema::{employees, pay_periods, payroll_results, payroll_run_failures};

/// Diesel-backed implementation of the `PayrollResultRepository` port.
#[derive(Clone)]
pub struct DieselPayrollResultRepository {
    pool: DbPool,
}

impl DieselPayrollResultRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PayrollResultRepositoryError {
    map_pool_failure(error)
}

fn map_diesel_error(error: diesel::result::Error) -> PayrollResultRepositoryError {
    map_diesel_failure(error, "payroll_results")
}

fn parse_warning(code: &str) -> Result<WarningCode, PayrollResultRepositoryError> {
    WarningCode::from_str(code).map_err(|err| PayrollResultRepositoryError::query(err.to_string()))
}

fn row_to_result(row: PayrollResultRow) -> Result<PayrollResult, PayrollResultRepositoryError> {
    let warnings = row
        .warnings
        .iter()
        .map(|code| parse_warning(code))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(PayrollResult {
        tenant_id: TenantId::from_uuid(row.tenant_id),
        period_id: row.period_id,
        employee_id: row.employee_id,
        gross: row.gross,
        deductions: row.deductions,
        net: row.net,
        currency: row.currency,
        warnings,
    })
}

fn row_to_failure(
    row: PayrollRunFailureRow,
) -> Result<PayrollRunFailure, PayrollResultRepositoryError> {
    Ok(PayrollRunFailure {
        tenant_id: TenantId::from_uuid(row.tenant_id),
        period_id: row.period_id,
        employee_id: row.employee_id,
        code: parse_warning(&row.code)?,
        message: row.message,
    })
}

fn failure_to_row(failure: &PayrollRunFailure) -> PayrollRunFailureRow {
    PayrollRunFailureRow {
        tenant_id: *failure.tenant_id.as_uuid(),
        period_id: failure.period_id,
        employee_id: failure.employee_id,
        code: failure.code.as_str().to_owned(),
        message: failure.message.clone(),
    }
}

type RegisterRow = (Uuid, String, String, Decimal, Decimal, Decimal, String);

#[async_trait]
impl PayrollResultRepository for DieselPayrollResultRepository {
    async fn upsert_result(
        &self,
        result: &PayrollResult,
    ) -> Result<(), PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPayrollResultRow {
            tenant_id: *result.tenant_id.as_uuid(),
            period_id: result.period_id,
            employee_id: result.employee_id,
            gross: result.gross,
            deductions: result.deductions,
            net: result.net,
            currency: &result.currency,
            warnings: result
                .warnings
                .iter()
                .map(|code| code.as_str().to_owned())
                .collect(),
        };

        diesel::insert_into(payroll_results::table)
            .values(&row)
            .on_conflict((payroll_results::period_id, payroll_results::employee_id))
            .do_update()
            .set((
                payroll_results::gross.eq(excluded(payroll_results::gross)),
                payroll_results::deductions.eq(excluded(payroll_results::deductions)),
                payroll_results::net.eq(excluded(payroll_results::net)),
                payroll_results::currency.eq(excluded(payroll_results::currency)),
                payroll_results::warnings.eq(excluded(payroll_results::warnings)),
                payroll_results::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn replace_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        failures: &[PayrollRunFailure],
    ) -> Result<(), PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let tenant = *tenant_id.as_uuid();
        let rows: Vec<PayrollRunFailureRow> = failures.iter().map(failure_to_row).collect();

        conn.transaction(|conn| {
            async move {
                diesel::delete(payroll_run_failures::table)
                    .filter(payroll_run_failures::tenant_id.eq(tenant))
                    .filter(payroll_run_failures::period_id.eq(period_id))
                    .execute(conn)
                    .await?;
                if !rows.is_empty() {
                    diesel::insert_into(payroll_run_failures::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_results(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollResult>, PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PayrollResultRow> = payroll_results::table
            .filter(payroll_results::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_results::period_id.eq(period_id))
            .order_by(payroll_results::employee_id)
            .select(PayrollResultRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_result).collect()
    }

    async fn list_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollRunFailure>, PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PayrollRunFailureRow> = payroll_run_failures::table
            .filter(payroll_run_failures::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_run_failures::period_id.eq(period_id))
            .order_by(payroll_run_failures::employee_id)
            .select(PayrollRunFailureRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_failure).collect()
    }

    async fn list_register_lines(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<RegisterLine>, PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RegisterRow> = payroll_results::table
            .inner_join(employees::table)
            .filter(payroll_results::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_results::period_id.eq(period_id))
            .order_by((employees::last_name, employees::first_name, employees::id))
            .select((
                payroll_results::employee_id,
                employees::first_name,
                employees::last_name,
                payroll_results::gross,
                payroll_results::deductions,
                payroll_results::net,
                payroll_results::currency,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(
                |(employee_id, first_name, last_name, gross, deductions, net, currency)| {
                    RegisterLine {
                        employee_id,
                        first_name,
                        last_name,
                        gross,
                        deductions,
                        net,
                        currency,
                    }
                },
            )
            .collect())
    }

    async fn latest_finalized_net(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        before: NaiveDate,
    ) -> Result<Option<Decimal>, PayrollResultRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        payroll_results::table
            .inner_join(pay_periods::table)
            .filter(payroll_results::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_results::employee_id.eq(employee_id))
            .filter(pay_periods::status.eq(PeriodStatus::Finalized.as_str()))
            .filter(pay_periods::start_date.lt(before))
            .order_by(pay_periods::end_date.desc())
            .select(payroll_results::net)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }
}
