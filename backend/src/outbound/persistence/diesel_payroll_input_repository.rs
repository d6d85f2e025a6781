//! PostgreSQL-backed `PayrollInputRepository` implementation covering the
//! pay element catalog, input lines and adjustments.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::payroll::{
    CalcType, ClassifiedInput, ElementType, PayElement, PayrollAdjustment, PayrollInput,
};
use crate::domain::ports::{PayrollInputRepository, PayrollInputRepositoryError};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{NewPayrollInputRow, PayElementRow, PayrollAdjustmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{pay_elements, payroll_adjustments, payroll_inputs};

/// Diesel-backed implementation of the `PayrollInputRepository` port.
#[derive(Clone)]
pub struct DieselPayrollInputRepository {
    pool: DbPool,
}

impl DieselPayrollInputRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PayrollInputRepositoryError {
    map_pool_failure(error)
}

fn map_diesel_error(error: diesel::result::Error) -> PayrollInputRepositoryError {
    map_diesel_failure(error, "payroll_inputs")
}

fn row_to_element(row: PayElementRow) -> Result<PayElement, PayrollInputRepositoryError> {
    let element_type = ElementType::from_str(&row.element_type)
        .map_err(|err| PayrollInputRepositoryError::query(err.to_string()))?;
    let calc_type = CalcType::from_str(&row.calc_type)
        .map_err(|err| PayrollInputRepositoryError::query(err.to_string()))?;
    Ok(PayElement {
        id: row.id,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        name: row.name,
        element_type,
        calc_type,
        default_amount: row.default_amount,
        taxable: row.taxable,
    })
}

fn element_to_row(element: &PayElement) -> PayElementRow {
    PayElementRow {
        id: element.id,
        tenant_id: *element.tenant_id.as_uuid(),
        name: element.name.clone(),
        element_type: element.element_type.as_str().to_owned(),
        calc_type: element.calc_type.as_str().to_owned(),
        default_amount: element.default_amount,
        taxable: element.taxable,
    }
}

fn row_to_adjustment(row: PayrollAdjustmentRow) -> PayrollAdjustment {
    PayrollAdjustment {
        id: row.id,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        period_id: row.period_id,
        employee_id: row.employee_id,
        description: row.description,
        amount: row.amount,
        effective_date: row.effective_date,
    }
}

/// Input lines whose element was deleted come back with no type so the
/// calculator can ignore them.
fn classify(element_type: Option<String>, amount: Decimal) -> ClassifiedInput {
    ClassifiedInput {
        element_type: element_type.and_then(|value| ElementType::from_str(&value).ok()),
        amount,
    }
}

#[async_trait]
impl PayrollInputRepository for DieselPayrollInputRepository {
    async fn create_element(
        &self,
        element: &PayElement,
    ) -> Result<(), PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(pay_elements::table)
            .values(&element_to_row(element))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_elements(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<PayElement>, PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PayElementRow> = pay_elements::table
            .filter(pay_elements::tenant_id.eq(*tenant_id.as_uuid()))
            .order_by((pay_elements::name, pay_elements::id))
            .select(PayElementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_element).collect()
    }

    async fn find_element(
        &self,
        tenant_id: &TenantId,
        element_id: Uuid,
    ) -> Result<Option<PayElement>, PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PayElementRow> = pay_elements::table
            .filter(pay_elements::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(pay_elements::id.eq(element_id))
            .select(PayElementRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_element).transpose()
    }

    async fn add_input(&self, input: &PayrollInput) -> Result<(), PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPayrollInputRow {
            id: input.id,
            tenant_id: *input.tenant_id.as_uuid(),
            period_id: input.period_id,
            employee_id: input.employee_id,
            element_id: input.element_id,
            units: input.units,
            rate: input.rate,
            amount: input.amount,
            source: input.source.as_str(),
        };

        diesel::insert_into(payroll_inputs::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_classified_inputs(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<ClassifiedInput>, PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<String>, Decimal)> = payroll_inputs::table
            .left_join(pay_elements::table)
            .filter(payroll_inputs::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_inputs::period_id.eq(period_id))
            .filter(payroll_inputs::employee_id.eq(employee_id))
            .order_by(payroll_inputs::created_at)
            .select((pay_elements::element_type.nullable(), payroll_inputs::amount))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(element_type, amount)| classify(element_type, amount))
            .collect())
    }

    async fn add_adjustment(
        &self,
        adjustment: &PayrollAdjustment,
    ) -> Result<(), PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = PayrollAdjustmentRow {
            id: adjustment.id,
            tenant_id: *adjustment.tenant_id.as_uuid(),
            period_id: adjustment.period_id,
            employee_id: adjustment.employee_id,
            description: adjustment.description.clone(),
            amount: adjustment.amount,
            effective_date: adjustment.effective_date,
        };

        diesel::insert_into(payroll_adjustments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_adjustment(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<bool, PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(payroll_adjustments::table)
            .filter(payroll_adjustments::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_adjustments::period_id.eq(period_id))
            .filter(payroll_adjustments::id.eq(adjustment_id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_adjustments(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<PayrollAdjustment>, PayrollInputRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PayrollAdjustmentRow> = payroll_adjustments::table
            .filter(payroll_adjustments::tenant_id.eq(*tenant_id.as_uuid()))
            .filter(payroll_adjustments::period_id.eq(period_id))
            .filter(payroll_adjustments::employee_id.eq(employee_id))
            .order_by(payroll_adjustments::created_at)
            .select(PayrollAdjustmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_adjustment).collect())
    }
}
