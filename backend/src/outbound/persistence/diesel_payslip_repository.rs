//! PostgreSQL-backed `PayslipRepository` implementation.
//!
//! Payslips are created one per payroll result; the
//! `(period_id, employee_id)` unique constraint makes creation idempotent so
//! finalize retries and explicit generation never duplicate documents.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{Payslip, PayslipFilter, PayslipRenderPayload};
use crate::domain::ports::{PayslipRepository, PayslipRepositoryError};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::PayslipRow;
use super::pool::{DbPool, PoolError};
use super::schema::{employees, pay_periods, payroll_results, payslips};

/// Diesel-backed implementation of the `PayslipRepository` port.
#[derive(Clone)]
pub struct DieselPayslipRepository {
    pool: DbPool,
}

impl DieselPayslipRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PayslipRepositoryError {
    map_pool_failure(error)
}

fn map_diesel_error(error: diesel::result::Error) -> PayslipRepositoryError {
    map_diesel_failure(error, "payslips")
}

pub(super) fn row_to_payslip(row: PayslipRow) -> Payslip {
    Payslip {
        id: row.id,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        period_id: row.period_id,
        employee_id: row.employee_id,
        file_ref: row.file_ref,
        created_at: row.created_at,
    }
}

/// Insert a payslip for every result of the period that lacks one and
/// return only the rows this call created.
pub(super) async fn insert_missing_payslips<C>(
    conn: &mut C,
    tenant_id: Uuid,
    period_id: Uuid,
    created_at: DateTime<Utc>,
) -> QueryResult<Vec<PayslipRow>>
where
    C: AsyncConnection<Backend = Pg> + Send,
{
    let employee_ids: Vec<Uuid> = payroll_results::table
        .filter(payroll_results::tenant_id.eq(tenant_id))
        .filter(payroll_results::period_id.eq(period_id))
        .select(payroll_results::employee_id)
        .load(conn)
        .await?;
    if employee_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<PayslipRow> = employee_ids
        .into_iter()
        .map(|employee_id| PayslipRow {
            id: Uuid::new_v4(),
            tenant_id,
            period_id,
            employee_id,
            file_ref: None,
            created_at,
        })
        .collect();

    diesel::insert_into(payslips::table)
        .values(&rows)
        .on_conflict((payslips::period_id, payslips::employee_id))
        .do_nothing()
        .returning(PayslipRow::as_returning())
        .get_results(conn)
        .await
}

/// Load every payslip of a period, ordered by employee.
pub(super) async fn load_period_payslips<C>(
    conn: &mut C,
    tenant_id: Uuid,
    period_id: Uuid,
) -> QueryResult<Vec<PayslipRow>>
where
    C: AsyncConnection<Backend = Pg> + Send,
{
    payslips::table
        .filter(payslips::tenant_id.eq(tenant_id))
        .filter(payslips::period_id.eq(period_id))
        .order_by(payslips::employee_id)
        .select(PayslipRow::as_select())
        .load(conn)
        .await
}

type PayslipHeader = (Uuid, Uuid, Uuid, String, String, String, (NaiveDate, NaiveDate));
type ResultTotals = (Decimal, Decimal, Decimal, String);

#[async_trait]
impl PayslipRepository for DieselPayslipRepository {
    async fn list(
        &self,
        tenant_id: &TenantId,
        filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = payslips::table
            .filter(payslips::tenant_id.eq(*tenant_id.as_uuid()))
            .select(PayslipRow::as_select())
            .order_by((payslips::created_at, payslips::id))
            .into_boxed();
        if let Some(period_id) = filter.period_id {
            query = query.filter(payslips::period_id.eq(period_id));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(payslips::employee_id.eq(employee_id));
        }

        let rows: Vec<PayslipRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_payslip).collect())
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<Payslip>, PayslipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PayslipRow> = payslips::table
            .filter(payslips::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payslips::id.eq(payslip_id))
            .select(PayslipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_payslip))
    }

    async fn create_missing_for_period(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows = insert_missing_payslips(&mut conn, *tenant_id.as_uuid(), period_id, created_at)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_payslip).collect())
    }

    async fn render_payload(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<PayslipRenderPayload>, PayslipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let header: Option<PayslipHeader> = payslips::table
            .inner_join(employees::table)
            .inner_join(pay_periods::table)
            .filter(payslips::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payslips::id.eq(payslip_id))
            .select((
                payslips::id,
                payslips::period_id,
                payslips::employee_id,
                employees::first_name,
                employees::last_name,
                employees::email,
                (pay_periods::start_date, pay_periods::end_date),
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some((id, period_id, employee_id, first_name, last_name, email, (start, end))) =
            header
        else {
            return Ok(None);
        };

        let totals: Option<ResultTotals> = payroll_results::table
            .filter(payroll_results::period_id.eq(period_id))
            .filter(payroll_results::employee_id.eq(employee_id))
            .select((
                payroll_results::gross,
                payroll_results::deductions,
                payroll_results::net,
                payroll_results::currency,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(totals.map(|(gross, deductions, net, currency)| PayslipRenderPayload {
            payslip_id: id,
            employee_id,
            first_name,
            last_name,
            email,
            period_start: start,
            period_end: end,
            gross,
            deductions,
            net,
            currency,
        }))
    }

    async fn set_file_ref(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
        file_ref: &str,
    ) -> Result<bool, PayslipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(payslips::table)
            .filter(payslips::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payslips::id.eq(payslip_id))
            .set(payslips::file_ref.eq(Some(file_ref)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}
