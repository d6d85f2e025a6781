//! PostgreSQL-backed `PayPeriodRepository` implementation.
//!
//! Status changes are `UPDATE ... WHERE status = <expected>`: when two
//! lifecycle calls race on the same period, PostgreSQL's row lock lets one
//! through and the other observes zero affected rows. Finalize and reopen
//! run their side tables in the same transaction as the status change.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{PayPeriod, Payslip, PeriodBounds, PeriodStatus};
use crate::domain::ports::{PayPeriodRepository, PayPeriodRepositoryError, ReopenedArtifacts};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::diesel_payslip_repository::{
    insert_missing_payslips, load_period_payslips, row_to_payslip,
};
use super::models::{NewPayPeriodRow, PayPeriodRow};
use super::pool::{DbPool, PoolError};
use super::schema::{pay_periods, payroll_results, payroll_run_failures, payslips};

/// Diesel-backed implementation of the `PayPeriodRepository` port.
#[derive(Clone)]
pub struct DieselPayPeriodRepository {
    pool: DbPool,
}

impl DieselPayPeriodRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PayPeriodRepositoryError {
    map_pool_failure(error)
}

fn map_diesel_error(error: diesel::result::Error) -> PayPeriodRepositoryError {
    map_diesel_failure(error, "pay_periods")
}

fn row_to_period(row: PayPeriodRow) -> Result<PayPeriod, PayPeriodRepositoryError> {
    let status = PeriodStatus::from_str(&row.status).map_err(|err| {
        PayPeriodRepositoryError::query(format!("invalid period status in database: {err:?}"))
    })?;
    let bounds = PeriodBounds::new(row.start_date, row.end_date)
        .map_err(|err| PayPeriodRepositoryError::query(format!("invalid period bounds: {err}")))?;

    Ok(PayPeriod {
        id: row.id,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        schedule_id: row.schedule_id,
        bounds,
        status,
        finalized_at: row.finalized_at,
    })
}

fn deleted_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl PayPeriodRepository for DieselPayPeriodRepository {
    async fn create(&self, period: &PayPeriod) -> Result<(), PayPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPayPeriodRow {
            id: period.id,
            tenant_id: *period.tenant_id.as_uuid(),
            schedule_id: period.schedule_id,
            start_date: period.bounds.start(),
            end_date: period.bounds.end(),
            status: period.status.as_str(),
        };

        diesel::insert_into(pay_periods::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<PayPeriod>, PayPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PayPeriodRow> = pay_periods::table
            .filter(pay_periods::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(pay_periods::id.eq(period_id))
            .select(PayPeriodRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_period).transpose()
    }

    async fn transition_status(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        from: PeriodStatus,
        to: PeriodStatus,
    ) -> Result<bool, PayPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(pay_periods::table)
            .filter(pay_periods::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(pay_periods::id.eq(period_id))
            .filter(pay_periods::status.eq(from.as_str()))
            .set(pay_periods::status.eq(to.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn finalize(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        finalized_at: DateTime<Utc>,
    ) -> Result<Option<Vec<Payslip>>, PayPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let tenant = *tenant_id.as_uuid();

        let rows = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(pay_periods::table)
                        .filter(pay_periods::tenant_id.eq(tenant))
                        .filter(pay_periods::id.eq(period_id))
                        .filter(pay_periods::status.eq(PeriodStatus::Reviewed.as_str()))
                        .set((
                            pay_periods::status.eq(PeriodStatus::Finalized.as_str()),
                            pay_periods::finalized_at.eq(Some(finalized_at)),
                        ))
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Ok(None);
                    }

                    let created =
                        insert_missing_payslips(conn, tenant, period_id, finalized_at).await?;
                    debug!(%period_id, created = created.len(), "payslips created at finalize");
                    load_period_payslips(conn, tenant, period_id).await.map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.map(|rows| rows.into_iter().map(row_to_payslip).collect()))
    }

    async fn reopen(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<ReopenedArtifacts>, PayPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let tenant = *tenant_id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(pay_periods::table)
                    .filter(pay_periods::tenant_id.eq(tenant))
                    .filter(pay_periods::id.eq(period_id))
                    .filter(pay_periods::status.eq(PeriodStatus::Finalized.as_str()))
                    .set((
                        pay_periods::status.eq(PeriodStatus::Draft.as_str()),
                        pay_periods::finalized_at.eq(None::<DateTime<Utc>>),
                    ))
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Ok(None);
                }

                let payslips_deleted = diesel::delete(payslips::table)
                    .filter(payslips::tenant_id.eq(tenant))
                    .filter(payslips::period_id.eq(period_id))
                    .execute(conn)
                    .await?;
                let results_deleted = diesel::delete(payroll_results::table)
                    .filter(payroll_results::tenant_id.eq(tenant))
                    .filter(payroll_results::period_id.eq(period_id))
                    .execute(conn)
                    .await?;
                let failures_deleted = diesel::delete(payroll_run_failures::table)
                    .filter(payroll_run_failures::tenant_id.eq(tenant))
                    .filter(payroll_run_failures::period_id.eq(period_id))
                    .execute(conn)
                    .await?;

                Ok(Some(ReopenedArtifacts {
                    results_deleted: deleted_count(results_deleted),
                    failures_deleted: deleted_count(failures_deleted),
                    payslips_deleted: deleted_count(payslips_deleted),
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn row() -> PayPeriodRow {
        PayPeriodRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date"),
            status: "reviewed".to_owned(),
            finalized_at: None,
        }
    }

    #[rstest]
    fn row_converts_to_period(row: PayPeriodRow) {
        let period = row_to_period(row).expect("valid row");

        assert_eq!(period.status, PeriodStatus::Reviewed);
        assert_eq!(period.bounds.days(), 30);
    }

    #[rstest]
    fn unknown_status_is_a_query_error(row: PayPeriodRow) {
        let err = row_to_period(PayPeriodRow {
            status: "archived".to_owned(),
            ..row
        })
        .expect_err("unknown status");

        assert!(matches!(err, PayPeriodRepositoryError::Query { .. }));
    }

    #[rstest]
    fn inverted_bounds_are_a_query_error(row: PayPeriodRow) {
        let err = row_to_period(PayPeriodRow {
            start_date: row.end_date,
            end_date: row.start_date,
            ..row
        })
        .expect_err("inverted bounds");

        assert!(err.to_string().contains("invalid period bounds"));
    }
}
