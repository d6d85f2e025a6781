//! Driving ports for the pay period lifecycle and period read models.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::payroll::{PayPeriod, PayrollSummary, PeriodBounds, PeriodStatus};
use crate::domain::{ActorContext, Error};

/// Request to open a new draft period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodRequest {
    /// Pay schedule the period belongs to.
    pub schedule_id: Uuid,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
}

/// Identifier of a newly created resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    /// New identifier.
    pub id: Uuid,
}

/// Status reached by a lifecycle action.
///
/// This is also the body cached for finalize replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatusResponse {
    /// New status.
    pub status: PeriodStatus,
}

/// Request to finalize a reviewed period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizePeriodRequest {
    /// Period to finalize.
    pub period_id: Uuid,
    /// Optional caller key; absent keys run the operation unguarded.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Finalize outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizePeriodResponse {
    /// Body returned to the caller.
    pub response: PeriodStatusResponse,
    /// Whether the body was replayed from an earlier call.
    pub replayed: bool,
}

/// Driving port for lifecycle mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollPeriodCommand: Send + Sync {
    /// Open a draft period.
    async fn create_period(
        &self,
        actor: &ActorContext,
        request: CreatePeriodRequest,
    ) -> Result<CreatedResponse, Error>;

    /// Calculate every active employee and move `draft → reviewed`.
    async fn run_period(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PeriodStatusResponse, Error>;

    /// Move `reviewed → finalized`, creating payslips exactly once.
    async fn finalize_period(
        &self,
        actor: &ActorContext,
        request: FinalizePeriodRequest,
    ) -> Result<FinalizePeriodResponse, Error>;

    /// Move `finalized → draft`, destroying derived artifacts.
    async fn reopen_period(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        reason: String,
    ) -> Result<PeriodStatusResponse, Error>;
}

/// Driving port for period read models and exports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollPeriodQuery: Send + Sync {
    /// Fetch a period.
    async fn get_period(&self, actor: &ActorContext, period_id: Uuid) -> Result<PayPeriod, Error>;

    /// Aggregate totals and warning counts.
    async fn summary(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PayrollSummary, Error>;

    /// Register CSV.
    async fn export_register(&self, actor: &ActorContext, period_id: Uuid)
    -> Result<String, Error>;

    /// Journal CSV.
    async fn export_journal(&self, actor: &ActorContext, period_id: Uuid) -> Result<String, Error>;
}

/// Fixture lifecycle that accepts every transition without persisting.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayrollPeriodCommand;

#[async_trait]
impl PayrollPeriodCommand for FixturePayrollPeriodCommand {
    async fn create_period(
        &self,
        _actor: &ActorContext,
        request: CreatePeriodRequest,
    ) -> Result<CreatedResponse, Error> {
        PeriodBounds::new(request.start_date, request.end_date)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(CreatedResponse { id: Uuid::new_v4() })
    }

    async fn run_period(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
    ) -> Result<PeriodStatusResponse, Error> {
        Ok(PeriodStatusResponse {
            status: PeriodStatus::Reviewed,
        })
    }

    async fn finalize_period(
        &self,
        _actor: &ActorContext,
        _request: FinalizePeriodRequest,
    ) -> Result<FinalizePeriodResponse, Error> {
        Ok(FinalizePeriodResponse {
            response: PeriodStatusResponse {
                status: PeriodStatus::Finalized,
            },
            replayed: false,
        })
    }

    async fn reopen_period(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
        _reason: String,
    ) -> Result<PeriodStatusResponse, Error> {
        Ok(PeriodStatusResponse {
            status: PeriodStatus::Draft,
        })
    }
}

/// Fixture query returning a one-day draft period with no results.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayrollPeriodQuery;

#[async_trait]
impl PayrollPeriodQuery for FixturePayrollPeriodQuery {
    async fn get_period(&self, actor: &ActorContext, period_id: Uuid) -> Result<PayPeriod, Error> {
        let today = Utc::now().date_naive();
        let bounds = PeriodBounds::new(today, today)
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(PayPeriod {
            id: period_id,
            ..PayPeriod::draft(actor.tenant_id().clone(), Uuid::nil(), bounds)
        })
    }

    async fn summary(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
    ) -> Result<PayrollSummary, Error> {
        Ok(PayrollSummary::default())
    }

    async fn export_register(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
    ) -> Result<String, Error> {
        crate::domain::payroll::write_register_csv(&[])
            .map_err(|err| Error::internal(err.to_string()))
    }

    async fn export_journal(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
    ) -> Result<String, Error> {
        crate::domain::payroll::write_journal_csv(&PayrollSummary::default())
            .map_err(|err| Error::internal(err.to_string()))
    }
}
