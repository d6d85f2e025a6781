//! Persisted payroll results, soft run failures and period summaries.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculator::PayrollComputation;
use super::warning::WarningCode;
use crate::domain::TenantId;

/// Calculated pay for one employee in one period. Unique per
/// `(period_id, employee_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollResult {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Period the result belongs to.
    pub period_id: Uuid,
    /// Employee the result belongs to.
    pub employee_id: Uuid,
    /// Gross pay.
    pub gross: Decimal,
    /// Total deductions.
    pub deductions: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// ISO currency of the employee's pay group.
    pub currency: String,
    /// Anomaly flags.
    pub warnings: BTreeSet<WarningCode>,
}

impl PayrollResult {
    /// Wrap a computation for persistence.
    pub fn from_computation(
        tenant_id: TenantId,
        period_id: Uuid,
        employee_id: Uuid,
        currency: String,
        computation: PayrollComputation,
    ) -> Self {
        Self {
            tenant_id,
            period_id,
            employee_id,
            gross: computation.gross,
            deductions: computation.deductions,
            net: computation.net,
            currency,
            warnings: computation.warnings,
        }
    }
}

/// Employee that could not be calculated during the latest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollRunFailure {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Period the run targeted.
    pub period_id: Uuid,
    /// Employee that failed.
    pub employee_id: Uuid,
    /// Always [`WarningCode::CalculationFailed`] today.
    pub code: WarningCode,
    /// Human-readable cause.
    pub message: String,
}

/// One row of the payroll register export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterLine {
    /// Employee identifier.
    pub employee_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Gross pay.
    pub gross: Decimal,
    /// Total deductions.
    pub deductions: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// ISO currency.
    pub currency: String,
}

/// Aggregated totals over a period's results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of deductions.
    pub total_deductions: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
    /// Number of results.
    pub employee_count: usize,
    /// Occurrences per warning code, including run failures.
    pub warnings: BTreeMap<WarningCode, usize>,
}

impl PayrollSummary {
    /// Summarise results and run failures of one period.
    pub fn from_results(results: &[PayrollResult], failures: &[PayrollRunFailure]) -> Self {
        let mut summary = Self {
            employee_count: results.len(),
            ..Self::default()
        };
        for result in results {
            summary.total_gross += result.gross;
            summary.total_deductions += result.deductions;
            summary.total_net += result.net;
            for warning in &result.warnings {
                *summary.warnings.entry(*warning).or_default() += 1;
            }
        }
        for failure in failures {
            *summary.warnings.entry(failure.code).or_default() += 1;
        }
        summary
    }
}
