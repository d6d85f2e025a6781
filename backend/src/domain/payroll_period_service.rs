//! Pay period lifecycle service.
//!
//! Implements [`PayrollPeriodCommand`] and [`PayrollPeriodQuery`]. The run
//! loop calculates every active employee sequentially; one employee failing
//! is recorded as a run failure and never aborts the batch. Finalize is
//! guarded by [`IdempotencyGuard`]; rendering and notifications run after the
//! commit as best-effort side effects.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::idempotency::IdempotentEndpoint;
use crate::domain::idempotency_guard::{GuardedRequest, IdempotencyGuard};
use crate::domain::payroll::{
    CalculationInput, EmployeePayProfile, LeaveWindow, LeaveWindowError,
    PayPeriod, PayrollResult, PayrollRunFailure, PayrollSummary, PeriodAction, PeriodBounds,
    PeriodStatus, Payslip, WarningCode, calculate, write_journal_csv, write_register_csv,
};
use crate::domain::payslip_materializer::PayslipMaterializer;
use crate::domain::ports::{
    CreatePeriodRequest, CreatedResponse, EmployeeDirectory, FinalizePeriodRequest,
    FinalizePeriodResponse, LeaveRepository, PayPeriodRepository, PayrollAuditLog,
    PayrollInputRepository, PayrollNotifier, PayrollPeriodCommand, PayrollPeriodQuery,
    PayrollResultRepository, PayslipNotification, PayslipRenderer, PayslipRepository,
    PeriodReopenedEvent, PeriodStatusResponse,
};
use crate::domain::service_support::{
    field_error, invalid_transition_error, load_period, map_directory_error, map_period_error,
    map_result_error,
};
use crate::domain::side_effect::{SideEffect, log_side_effect_failure};
use crate::domain::{ActorContext, Error, TenantId};

/// Driven ports the payroll services read and write.
#[derive(Clone)]
pub struct PayrollRepositories {
    /// Pay periods and their transitions.
    pub periods: Arc<dyn PayPeriodRepository>,
    /// Results and run failures.
    pub results: Arc<dyn PayrollResultRepository>,
    /// Element catalog, inputs and adjustments.
    pub inputs: Arc<dyn PayrollInputRepository>,
    /// Active employees.
    pub employees: Arc<dyn EmployeeDirectory>,
    /// Approved unpaid leave.
    pub leave: Arc<dyn LeaveRepository>,
    /// Payslip rows.
    pub payslips: Arc<dyn PayslipRepository>,
}

/// External collaborators invoked after commits.
#[derive(Clone)]
pub struct PayrollCollaborators {
    /// Document renderer.
    pub renderer: Arc<dyn PayslipRenderer>,
    /// Employee notifications.
    pub notifier: Arc<dyn PayrollNotifier>,
    /// Audit trail.
    pub audit: Arc<dyn PayrollAuditLog>,
}

#[derive(Debug, thiserror::Error)]
enum EmployeeRunError {
    #[error("employee has no base salary")]
    MissingBaseSalary,
    #[error("invalid leave data: {0}")]
    InvalidLeave(#[from] LeaveWindowError),
    #[error("{0}")]
    Persistence(String),
}

impl EmployeeRunError {
    fn persistence(error: impl std::fmt::Display) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Lifecycle service over the payroll ports.
#[derive(Clone)]
pub struct PayrollPeriodService {
    repos: PayrollRepositories,
    materializer: PayslipMaterializer,
    notifier: Arc<dyn PayrollNotifier>,
    audit: Arc<dyn PayrollAuditLog>,
    guard: IdempotencyGuard,
    clock: Arc<dyn Clock>,
}

impl PayrollPeriodService {
    /// Create the service.
    pub fn new(
        repos: PayrollRepositories,
        collaborators: PayrollCollaborators,
        guard: IdempotencyGuard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let materializer =
            PayslipMaterializer::new(Arc::clone(&repos.payslips), collaborators.renderer);
        Self {
            repos,
            materializer,
            notifier: collaborators.notifier,
            audit: collaborators.audit,
            guard,
            clock,
        }
    }

    /// Report a transition lost to a concurrent caller using the status now
    /// stored.
    async fn lost_transition(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        action: PeriodAction,
    ) -> Error {
        match load_period(self.repos.periods.as_ref(), actor, period_id).await {
            Ok(period) => match period.check(action) {
                Err(transition) => invalid_transition_error(transition),
                Ok(_) => Error::invalid_state_transition(format!(
                    "pay period {period_id} changed status concurrently"
                )),
            },
            Err(err) => err,
        }
    }

    async fn calculate_employee(
        &self,
        period: &PayPeriod,
        profile: &EmployeePayProfile,
    ) -> Result<PayrollResult, EmployeeRunError> {
        let base_salary = profile
            .base_salary
            .ok_or(EmployeeRunError::MissingBaseSalary)?;
        let tenant_id = &period.tenant_id;
        let employee_id = profile.employee_id;

        let inputs = self
            .repos
            .inputs
            .list_classified_inputs(tenant_id, period.id, employee_id)
            .await
            .map_err(EmployeeRunError::persistence)?;
        let adjustments = self
            .repos
            .inputs
            .list_adjustments(tenant_id, period.id, employee_id)
            .await
            .map_err(EmployeeRunError::persistence)?;
        let leave_windows = self
            .repos
            .leave
            .unpaid_leave_overlapping(tenant_id, employee_id, &period.bounds)
            .await
            .map_err(EmployeeRunError::persistence)?
            .into_iter()
            .map(LeaveWindow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let previous_net = self
            .repos
            .results
            .latest_finalized_net(tenant_id, employee_id, period.bounds.start())
            .await
            .map_err(EmployeeRunError::persistence)?;

        let computation = calculate(&CalculationInput {
            bounds: &period.bounds,
            base_salary,
            inputs: &inputs,
            leave_windows: &leave_windows,
            adjustments: &adjustments,
            previous_net,
            has_bank_account: profile.has_bank_account,
        });
        let result = PayrollResult::from_computation(
            tenant_id.clone(),
            period.id,
            employee_id,
            profile.currency.clone(),
            computation,
        );
        self.repos
            .results
            .upsert_result(&result)
            .await
            .map_err(EmployeeRunError::persistence)?;
        Ok(result)
    }

    async fn finalize_once(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PeriodStatusResponse, Error> {
        let period = load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        period
            .check(PeriodAction::Finalize)
            .map_err(invalid_transition_error)?;

        let payslips = match self
            .repos
            .periods
            .finalize(actor.tenant_id(), period_id, self.clock.utc())
            .await
            .map_err(map_period_error)?
        {
            Some(payslips) => payslips,
            None => {
                return Err(self
                    .lost_transition(actor, period_id, PeriodAction::Finalize)
                    .await);
            }
        };
        info!(
            tenant_id = %actor.tenant_id(),
            %period_id,
            payslips = payslips.len(),
            "pay period finalized"
        );

        self.materializer
            .materialize_missing(actor.tenant_id(), &payslips)
            .await;
        self.notify_payslips(actor.tenant_id(), &payslips).await;

        Ok(PeriodStatusResponse {
            status: PeriodStatus::Finalized,
        })
    }

    async fn notify_payslips(&self, tenant_id: &TenantId, payslips: &[Payslip]) {
        for payslip in payslips {
            let notification = PayslipNotification {
                tenant_id: tenant_id.clone(),
                period_id: payslip.period_id,
                employee_id: payslip.employee_id,
                payslip_id: payslip.id,
            };
            if let Err(err) = self.notifier.payslip_available(&notification).await {
                log_side_effect_failure(
                    SideEffect::PayslipNotification,
                    tenant_id,
                    payslip.period_id,
                    Some(payslip.employee_id),
                    &err,
                );
            }
        }
    }

    async fn load_summary(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PayrollSummary, Error> {
        load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        let results = self
            .repos
            .results
            .list_results(actor.tenant_id(), period_id)
            .await
            .map_err(map_result_error)?;
        let failures = self
            .repos
            .results
            .list_run_failures(actor.tenant_id(), period_id)
            .await
            .map_err(map_result_error)?;
        Ok(PayrollSummary::from_results(&results, &failures))
    }
}

#[async_trait]
impl PayrollPeriodCommand for PayrollPeriodService {
    async fn create_period(
        &self,
        actor: &ActorContext,
        request: CreatePeriodRequest,
    ) -> Result<CreatedResponse, Error> {
        let bounds = PeriodBounds::new(request.start_date, request.end_date)
            .map_err(|err| field_error("startDate", err.code(), err.to_string()))?;
        let period = PayPeriod::draft(actor.tenant_id().clone(), request.schedule_id, bounds);
        self.repos
            .periods
            .create(&period)
            .await
            .map_err(map_period_error)?;
        info!(tenant_id = %actor.tenant_id(), period_id = %period.id, "pay period created");
        Ok(CreatedResponse { id: period.id })
    }

    async fn run_period(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PeriodStatusResponse, Error> {
        let period = load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        period
            .check(PeriodAction::Run)
            .map_err(invalid_transition_error)?;

        let profiles = self
            .repos
            .employees
            .list_active_profiles(actor.tenant_id())
            .await
            .map_err(map_directory_error)?;

        let mut failures = Vec::new();
        for profile in &profiles {
            if let Err(err) = self.calculate_employee(&period, profile).await {
                warn!(
                    tenant_id = %actor.tenant_id(),
                    %period_id,
                    employee_id = %profile.employee_id,
                    error = %err,
                    "payroll calculation failed for employee"
                );
                failures.push(PayrollRunFailure {
                    tenant_id: actor.tenant_id().clone(),
                    period_id,
                    employee_id: profile.employee_id,
                    code: WarningCode::CalculationFailed,
                    message: err.to_string(),
                });
            }
        }
        self.repos
            .results
            .replace_run_failures(actor.tenant_id(), period_id, &failures)
            .await
            .map_err(map_result_error)?;

        let moved = self
            .repos
            .periods
            .transition_status(
                actor.tenant_id(),
                period_id,
                PeriodStatus::Draft,
                PeriodStatus::Reviewed,
            )
            .await
            .map_err(map_period_error)?;
        if !moved {
            return Err(self.lost_transition(actor, period_id, PeriodAction::Run).await);
        }
        info!(
            tenant_id = %actor.tenant_id(),
            %period_id,
            employees = profiles.len(),
            failed = failures.len(),
            "payroll run finished"
        );
        Ok(PeriodStatusResponse {
            status: PeriodStatus::Reviewed,
        })
    }

    async fn finalize_period(
        &self,
        actor: &ActorContext,
        request: FinalizePeriodRequest,
    ) -> Result<FinalizePeriodResponse, Error> {
        let period_id = request.period_id;
        let guarded = GuardedRequest {
            actor,
            key: request.idempotency_key,
            endpoint: IdempotentEndpoint::PayrollFinalize,
            discriminator: json!({ "periodId": period_id }),
        };
        let outcome = self
            .guard
            .run(guarded, || self.finalize_once(actor, period_id))
            .await?;
        Ok(FinalizePeriodResponse {
            response: outcome.value,
            replayed: outcome.replayed,
        })
    }

    async fn reopen_period(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        reason: String,
    ) -> Result<PeriodStatusResponse, Error> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(field_error(
                "reason",
                "required",
                "a reason is required to reopen a pay period",
            ));
        }
        let period = load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        period
            .check(PeriodAction::Reopen)
            .map_err(invalid_transition_error)?;

        let Some(artifacts) = self
            .repos
            .periods
            .reopen(actor.tenant_id(), period_id)
            .await
            .map_err(map_period_error)?
        else {
            return Err(self
                .lost_transition(actor, period_id, PeriodAction::Reopen)
                .await);
        };
        info!(
            tenant_id = %actor.tenant_id(),
            %period_id,
            results_deleted = artifacts.results_deleted,
            failures_deleted = artifacts.failures_deleted,
            payslips_deleted = artifacts.payslips_deleted,
            "pay period reopened"
        );

        let event = PeriodReopenedEvent {
            tenant_id: actor.tenant_id().clone(),
            user_id: actor.user_id().clone(),
            period_id,
            reason: reason.to_owned(),
            results_deleted: artifacts.results_deleted,
            payslips_deleted: artifacts.payslips_deleted,
            occurred_at: self.clock.utc(),
        };
        if let Err(err) = self.audit.period_reopened(&event).await {
            log_side_effect_failure(
                SideEffect::ReopenAudit,
                actor.tenant_id(),
                period_id,
                None,
                &err,
            );
        }
        Ok(PeriodStatusResponse {
            status: PeriodStatus::Draft,
        })
    }
}

#[async_trait]
impl PayrollPeriodQuery for PayrollPeriodService {
    async fn get_period(&self, actor: &ActorContext, period_id: Uuid) -> Result<PayPeriod, Error> {
        load_period(self.repos.periods.as_ref(), actor, period_id).await
    }

    async fn summary(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<PayrollSummary, Error> {
        self.load_summary(actor, period_id).await
    }

    async fn export_register(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<String, Error> {
        load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        let lines = self
            .repos
            .results
            .list_register_lines(actor.tenant_id(), period_id)
            .await
            .map_err(map_result_error)?;
        write_register_csv(&lines)
            .map_err(|err| Error::internal(format!("failed to write register export: {err}")))
    }

    async fn export_journal(&self, actor: &ActorContext, period_id: Uuid) -> Result<String, Error> {
        let summary = self.load_summary(actor, period_id).await?;
        write_journal_csv(&summary)
            .map_err(|err| Error::internal(format!("failed to write journal export: {err}")))
    }
}

#[cfg(test)]
#[path = "payroll_period_service_tests.rs"]
mod tests;
