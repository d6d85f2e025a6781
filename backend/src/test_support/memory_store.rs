//! In-memory implementation of every payroll repository port.
//!
//! One mutex guards the whole store, so conditional transitions and the
//! finalize/reopen side tables change atomically just as they do inside a
//! database transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::idempotency::{
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};
use crate::domain::payroll::{
    ClassifiedInput, EmployeePayProfile, PayElement, PayPeriod, PayrollAdjustment, PayrollInput,
    PayrollResult, PayrollRunFailure, Payslip, PayslipFilter, PayslipRenderPayload, PeriodBounds,
    PeriodStatus, RegisterLine, UnpaidLeaveSpan,
};
use crate::domain::ports::{
    EmployeeDirectory, EmployeeDirectoryError, IdempotencyRepository, IdempotencyRepositoryError,
    LeaveRepository, PayPeriodRepository, PayPeriodRepositoryError, PayrollInputRepository,
    PayrollInputRepositoryError, PayrollResultRepository, PayrollResultRepositoryError,
    PayslipRepository, PayslipRepositoryError, ReopenedArtifacts,
};

struct StoredEmployee {
    tenant_id: TenantId,
    profile: EmployeePayProfile,
    active: bool,
}

struct StoredLeave {
    tenant_id: TenantId,
    employee_id: Uuid,
    span: UnpaidLeaveSpan,
}

#[derive(Default)]
struct StoreState {
    periods: HashMap<Uuid, PayPeriod>,
    results: Vec<PayrollResult>,
    failures: Vec<PayrollRunFailure>,
    elements: Vec<PayElement>,
    inputs: Vec<PayrollInput>,
    adjustments: Vec<PayrollAdjustment>,
    employees: Vec<StoredEmployee>,
    leave: Vec<StoredLeave>,
    payslips: Vec<Payslip>,
    idempotency: Vec<IdempotencyRecord>,
}

impl StoreState {
    fn period(&self, tenant_id: &TenantId, period_id: Uuid) -> Option<&PayPeriod> {
        self.periods
            .get(&period_id)
            .filter(|period| &period.tenant_id == tenant_id)
    }

    fn period_mut(&mut self, tenant_id: &TenantId, period_id: Uuid) -> Option<&mut PayPeriod> {
        self.periods
            .get_mut(&period_id)
            .filter(|period| &period.tenant_id == tenant_id)
    }

    fn employee(&self, tenant_id: &TenantId, employee_id: Uuid) -> Option<&EmployeePayProfile> {
        self.employees
            .iter()
            .find(|stored| {
                &stored.tenant_id == tenant_id && stored.profile.employee_id == employee_id
            })
            .map(|stored| &stored.profile)
    }

    fn period_results<'a>(
        &'a self,
        tenant_id: &'a TenantId,
        period_id: Uuid,
    ) -> impl Iterator<Item = &'a PayrollResult> + 'a {
        self.results
            .iter()
            .filter(move |result| &result.tenant_id == tenant_id && result.period_id == period_id)
    }

    fn insert_missing_payslips(
        &mut self,
        tenant_id: &TenantId,
        period_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Vec<Payslip> {
        let mut missing: Vec<Uuid> = self
            .period_results(tenant_id, period_id)
            .map(|result| result.employee_id)
            .filter(|employee_id| {
                !self.payslips.iter().any(|payslip| {
                    payslip.period_id == period_id && payslip.employee_id == *employee_id
                })
            })
            .collect();
        missing.sort_unstable();

        let created: Vec<Payslip> = missing
            .into_iter()
            .map(|employee_id| Payslip {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.clone(),
                period_id,
                employee_id,
                file_ref: None,
                created_at,
            })
            .collect();
        self.payslips.extend(created.iter().cloned());
        created
    }

    fn period_payslips(&self, tenant_id: &TenantId, period_id: Uuid) -> Vec<Payslip> {
        let mut payslips: Vec<Payslip> = self
            .payslips
            .iter()
            .filter(|payslip| &payslip.tenant_id == tenant_id && payslip.period_id == period_id)
            .cloned()
            .collect();
        payslips.sort_by_key(|payslip| payslip.employee_id);
        payslips
    }
}

fn same_record(record: &IdempotencyRecord, query: &IdempotencyLookupQuery) -> bool {
    record.tenant_id == query.tenant_id
        && record.user_id == query.user_id
        && record.key == query.key
        && record.endpoint == query.endpoint
}

fn removed_count(before: usize, after: usize) -> u64 {
    u64::try_from(before.saturating_sub(after)).unwrap_or(u64::MAX)
}

/// Shared in-memory store backing every repository port.
///
/// Cloning is cheap and clones observe the same data.
#[derive(Clone, Default)]
pub struct InMemoryPayrollStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryPayrollStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("payroll store mutex"),
        }
    }

    /// Add an active employee.
    pub fn seed_employee(&self, tenant_id: &TenantId, profile: EmployeePayProfile) {
        self.lock_state().employees.push(StoredEmployee {
            tenant_id: tenant_id.clone(),
            profile,
            active: true,
        });
    }

    /// Add an employee that is excluded from payroll runs.
    pub fn seed_inactive_employee(&self, tenant_id: &TenantId, profile: EmployeePayProfile) {
        self.lock_state().employees.push(StoredEmployee {
            tenant_id: tenant_id.clone(),
            profile,
            active: false,
        });
    }

    /// Record approved unpaid leave for an employee.
    pub fn seed_unpaid_leave(&self, tenant_id: &TenantId, employee_id: Uuid, span: UnpaidLeaveSpan) {
        self.lock_state().leave.push(StoredLeave {
            tenant_id: tenant_id.clone(),
            employee_id,
            span,
        });
    }

    /// Payslips currently stored for a period.
    pub fn payslips_for(&self, tenant_id: &TenantId, period_id: Uuid) -> Vec<Payslip> {
        self.lock_state().period_payslips(tenant_id, period_id)
    }

    /// Results currently stored for a period.
    pub fn results_for(&self, tenant_id: &TenantId, period_id: Uuid) -> Vec<PayrollResult> {
        self.lock_state()
            .period_results(tenant_id, period_id)
            .cloned()
            .collect()
    }

    /// Idempotency records currently stored.
    pub fn idempotency_records(&self) -> Vec<IdempotencyRecord> {
        self.lock_state().idempotency.clone()
    }
}

#[async_trait]
impl PayPeriodRepository for InMemoryPayrollStore {
    async fn create(&self, period: &PayPeriod) -> Result<(), PayPeriodRepositoryError> {
        let mut state = self.lock_state();
        if state.periods.contains_key(&period.id) {
            return Err(PayPeriodRepositoryError::query(format!(
                "duplicate period {}",
                period.id
            )));
        }
        state.periods.insert(period.id, period.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<PayPeriod>, PayPeriodRepositoryError> {
        Ok(self.lock_state().period(tenant_id, period_id).cloned())
    }

    async fn transition_status(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        from: PeriodStatus,
        to: PeriodStatus,
    ) -> Result<bool, PayPeriodRepositoryError> {
        let mut state = self.lock_state();
        match state.period_mut(tenant_id, period_id) {
            Some(period) if period.status == from => {
                period.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finalize(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        finalized_at: DateTime<Utc>,
    ) -> Result<Option<Vec<Payslip>>, PayPeriodRepositoryError> {
        let mut state = self.lock_state();
        match state.period_mut(tenant_id, period_id) {
            Some(period) if period.status == PeriodStatus::Reviewed => {
                period.status = PeriodStatus::Finalized;
                period.finalized_at = Some(finalized_at);
            }
            _ => return Ok(None),
        }
        state.insert_missing_payslips(tenant_id, period_id, finalized_at);
        Ok(Some(state.period_payslips(tenant_id, period_id)))
    }

    async fn reopen(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Option<ReopenedArtifacts>, PayPeriodRepositoryError> {
        let mut state = self.lock_state();
        match state.period_mut(tenant_id, period_id) {
            Some(period) if period.status == PeriodStatus::Finalized => {
                period.status = PeriodStatus::Draft;
                period.finalized_at = None;
            }
            _ => return Ok(None),
        }

        let in_period = |owner: &TenantId, id: Uuid| owner == tenant_id && id == period_id;
        let payslips_before = state.payslips.len();
        state
            .payslips
            .retain(|payslip| !in_period(&payslip.tenant_id, payslip.period_id));
        let results_before = state.results.len();
        state
            .results
            .retain(|result| !in_period(&result.tenant_id, result.period_id));
        let failures_before = state.failures.len();
        state
            .failures
            .retain(|failure| !in_period(&failure.tenant_id, failure.period_id));

        Ok(Some(ReopenedArtifacts {
            results_deleted: removed_count(results_before, state.results.len()),
            failures_deleted: removed_count(failures_before, state.failures.len()),
            payslips_deleted: removed_count(payslips_before, state.payslips.len()),
        }))
    }
}

#[async_trait]
impl PayrollResultRepository for InMemoryPayrollStore {
    async fn upsert_result(
        &self,
        result: &PayrollResult,
    ) -> Result<(), PayrollResultRepositoryError> {
        let mut state = self.lock_state();
        state.results.retain(|existing| {
            !(existing.period_id == result.period_id && existing.employee_id == result.employee_id)
        });
        state.results.push(result.clone());
        Ok(())
    }

    async fn replace_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        failures: &[PayrollRunFailure],
    ) -> Result<(), PayrollResultRepositoryError> {
        let mut state = self.lock_state();
        state
            .failures
            .retain(|failure| !(&failure.tenant_id == tenant_id && failure.period_id == period_id));
        state.failures.extend(failures.iter().cloned());
        Ok(())
    }

    async fn list_results(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollResult>, PayrollResultRepositoryError> {
        let mut results = self.results_for(tenant_id, period_id);
        results.sort_by_key(|result| result.employee_id);
        Ok(results)
    }

    async fn list_run_failures(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<PayrollRunFailure>, PayrollResultRepositoryError> {
        let state = self.lock_state();
        let mut failures: Vec<PayrollRunFailure> = state
            .failures
            .iter()
            .filter(|failure| &failure.tenant_id == tenant_id && failure.period_id == period_id)
            .cloned()
            .collect();
        failures.sort_by_key(|failure| failure.employee_id);
        Ok(failures)
    }

    async fn list_register_lines(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
    ) -> Result<Vec<RegisterLine>, PayrollResultRepositoryError> {
        let state = self.lock_state();
        let mut lines: Vec<RegisterLine> = state
            .period_results(tenant_id, period_id)
            .filter_map(|result| {
                state
                    .employee(tenant_id, result.employee_id)
                    .map(|profile| RegisterLine {
                        employee_id: result.employee_id,
                        first_name: profile.first_name.clone(),
                        last_name: profile.last_name.clone(),
                        gross: result.gross,
                        deductions: result.deductions,
                        net: result.net,
                        currency: result.currency.clone(),
                    })
            })
            .collect();
        lines.sort_by(|left, right| {
            (&left.last_name, &left.first_name, left.employee_id).cmp(&(
                &right.last_name,
                &right.first_name,
                right.employee_id,
            ))
        });
        Ok(lines)
    }

    async fn latest_finalized_net(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        before: NaiveDate,
    ) -> Result<Option<Decimal>, PayrollResultRepositoryError> {
        let state = self.lock_state();
        Ok(state
            .results
            .iter()
            .filter(|result| &result.tenant_id == tenant_id && result.employee_id == employee_id)
            .filter_map(|result| {
                state
                    .period(tenant_id, result.period_id)
                    .filter(|period| {
                        period.status == PeriodStatus::Finalized && period.bounds.start() < before
                    })
                    .map(|period| (period.bounds.end(), result.net))
            })
            .max_by_key(|(end, _)| *end)
            .map(|(_, net)| net))
    }
}

#[async_trait]
impl PayrollInputRepository for InMemoryPayrollStore {
    async fn create_element(
        &self,
        element: &PayElement,
    ) -> Result<(), PayrollInputRepositoryError> {
        self.lock_state().elements.push(element.clone());
        Ok(())
    }

    async fn list_elements(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<PayElement>, PayrollInputRepositoryError> {
        let state = self.lock_state();
        let mut elements: Vec<PayElement> = state
            .elements
            .iter()
            .filter(|element| &element.tenant_id == tenant_id)
            .cloned()
            .collect();
        elements.sort_by(|left, right| (&left.name, left.id).cmp(&(&right.name, right.id)));
        Ok(elements)
    }

    async fn find_element(
        &self,
        tenant_id: &TenantId,
        element_id: Uuid,
    ) -> Result<Option<PayElement>, PayrollInputRepositoryError> {
        Ok(self
            .lock_state()
            .elements
            .iter()
            .find(|element| &element.tenant_id == tenant_id && element.id == element_id)
            .cloned())
    }

    async fn add_input(&self, input: &PayrollInput) -> Result<(), PayrollInputRepositoryError> {
        self.lock_state().inputs.push(input.clone());
        Ok(())
    }

    async fn list_classified_inputs(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<ClassifiedInput>, PayrollInputRepositoryError> {
        let state = self.lock_state();
        Ok(state
            .inputs
            .iter()
            .filter(|input| {
                &input.tenant_id == tenant_id
                    && input.period_id == period_id
                    && input.employee_id == employee_id
            })
            .map(|input| ClassifiedInput {
                element_type: state
                    .elements
                    .iter()
                    .find(|element| element.id == input.element_id)
                    .map(|element| element.element_type),
                amount: input.amount,
            })
            .collect())
    }

    async fn add_adjustment(
        &self,
        adjustment: &PayrollAdjustment,
    ) -> Result<(), PayrollInputRepositoryError> {
        self.lock_state().adjustments.push(adjustment.clone());
        Ok(())
    }

    async fn delete_adjustment(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<bool, PayrollInputRepositoryError> {
        let mut state = self.lock_state();
        let before = state.adjustments.len();
        state.adjustments.retain(|adjustment| {
            !(&adjustment.tenant_id == tenant_id
                && adjustment.period_id == period_id
                && adjustment.id == adjustment_id)
        });
        Ok(state.adjustments.len() < before)
    }

    async fn list_adjustments(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<PayrollAdjustment>, PayrollInputRepositoryError> {
        Ok(self
            .lock_state()
            .adjustments
            .iter()
            .filter(|adjustment| {
                &adjustment.tenant_id == tenant_id
                    && adjustment.period_id == period_id
                    && adjustment.employee_id == employee_id
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryPayrollStore {
    async fn list_active_profiles(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<EmployeePayProfile>, EmployeeDirectoryError> {
        let state = self.lock_state();
        let mut profiles: Vec<EmployeePayProfile> = state
            .employees
            .iter()
            .filter(|stored| &stored.tenant_id == tenant_id && stored.active)
            .map(|stored| stored.profile.clone())
            .collect();
        profiles.sort_by(|left, right| {
            (&left.last_name, &left.first_name, left.employee_id).cmp(&(
                &right.last_name,
                &right.first_name,
                right.employee_id,
            ))
        });
        Ok(profiles)
    }

    async fn find_employee_id_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<Uuid>, EmployeeDirectoryError> {
        let wanted = email.to_lowercase();
        Ok(self
            .lock_state()
            .employees
            .iter()
            .find(|stored| {
                &stored.tenant_id == tenant_id && stored.profile.email.to_lowercase() == wanted
            })
            .map(|stored| stored.profile.employee_id))
    }

    async fn employee_exists(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
    ) -> Result<bool, EmployeeDirectoryError> {
        Ok(self.lock_state().employee(tenant_id, employee_id).is_some())
    }
}

#[async_trait]
impl LeaveRepository for InMemoryPayrollStore {
    async fn unpaid_leave_overlapping(
        &self,
        tenant_id: &TenantId,
        employee_id: Uuid,
        bounds: &PeriodBounds,
    ) -> Result<Vec<UnpaidLeaveSpan>, EmployeeDirectoryError> {
        let state = self.lock_state();
        let mut spans: Vec<UnpaidLeaveSpan> = state
            .leave
            .iter()
            .filter(|stored| &stored.tenant_id == tenant_id && stored.employee_id == employee_id)
            .map(|stored| stored.span)
            .filter(|span| span.start_date <= bounds.end() && span.end_date >= bounds.start())
            .collect();
        spans.sort_by_key(|span| span.start_date);
        Ok(spans)
    }
}

#[async_trait]
impl PayslipRepository for InMemoryPayrollStore {
    async fn list(
        &self,
        tenant_id: &TenantId,
        filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError> {
        let state = self.lock_state();
        let mut payslips: Vec<Payslip> = state
            .payslips
            .iter()
            .filter(|payslip| &payslip.tenant_id == tenant_id && filter.matches(payslip))
            .cloned()
            .collect();
        payslips.sort_by_key(|payslip| (payslip.created_at, payslip.id));
        Ok(payslips)
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<Payslip>, PayslipRepositoryError> {
        Ok(self
            .lock_state()
            .payslips
            .iter()
            .find(|payslip| &payslip.tenant_id == tenant_id && payslip.id == payslip_id)
            .cloned())
    }

    async fn create_missing_for_period(
        &self,
        tenant_id: &TenantId,
        period_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Payslip>, PayslipRepositoryError> {
        Ok(self
            .lock_state()
            .insert_missing_payslips(tenant_id, period_id, created_at))
    }

    async fn render_payload(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
    ) -> Result<Option<PayslipRenderPayload>, PayslipRepositoryError> {
        let state = self.lock_state();
        let Some(payslip) = state
            .payslips
            .iter()
            .find(|payslip| &payslip.tenant_id == tenant_id && payslip.id == payslip_id)
        else {
            return Ok(None);
        };
        let period = state.period(tenant_id, payslip.period_id);
        let employee = state.employee(tenant_id, payslip.employee_id);
        let result = state.period_results(tenant_id, payslip.period_id).find(|result| {
            result.employee_id == payslip.employee_id
        });

        Ok(match (period, employee, result) {
            (Some(period), Some(employee), Some(result)) => Some(PayslipRenderPayload {
                payslip_id: payslip.id,
                employee_id: payslip.employee_id,
                first_name: employee.first_name.clone(),
                last_name: employee.last_name.clone(),
                email: employee.email.clone(),
                period_start: period.bounds.start(),
                period_end: period.bounds.end(),
                gross: result.gross,
                deductions: result.deductions,
                net: result.net,
                currency: result.currency.clone(),
            }),
            _ => None,
        })
    }

    async fn set_file_ref(
        &self,
        tenant_id: &TenantId,
        payslip_id: Uuid,
        file_ref: &str,
    ) -> Result<bool, PayslipRepositoryError> {
        let mut state = self.lock_state();
        match state
            .payslips
            .iter_mut()
            .find(|payslip| &payslip.tenant_id == tenant_id && payslip.id == payslip_id)
        {
            Some(payslip) => {
                payslip.file_ref = Some(file_ref.to_owned());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryPayrollStore {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
        now: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let state = self.lock_state();
        let record = state
            .idempotency
            .iter()
            .find(|record| same_record(record, query) && !record.is_expired(now))
            .cloned();
        Ok(IdempotencyLookupResult::classify(record, &query.request_hash))
    }

    async fn claim(
        &self,
        record: &IdempotencyRecord,
        now: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        let query = IdempotencyLookupQuery {
            tenant_id: record.tenant_id.clone(),
            user_id: record.user_id.clone(),
            key: record.key.clone(),
            endpoint: record.endpoint,
            request_hash: record.request_hash.clone(),
        };
        let mut state = self.lock_state();
        state
            .idempotency
            .retain(|existing| !(same_record(existing, &query) && existing.is_expired(now)));
        if state
            .idempotency
            .iter()
            .any(|existing| same_record(existing, &query))
        {
            return Err(IdempotencyRepositoryError::duplicate_key(
                record.key.to_string(),
            ));
        }
        state.idempotency.push(record.clone());
        Ok(())
    }

    async fn complete(
        &self,
        query: &IdempotencyLookupQuery,
        response: &serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        let mut state = self.lock_state();
        let Some(record) = state
            .idempotency
            .iter_mut()
            .find(|record| same_record(record, query))
        else {
            return Err(IdempotencyRepositoryError::query(format!(
                "no claim to complete for key {}",
                query.key
            )));
        };
        record.cached_response = Some(response.clone());
        record.expires_at = expires_at;
        Ok(())
    }

    async fn release(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<(), IdempotencyRepositoryError> {
        self.lock_state()
            .idempotency
            .retain(|record| !(same_record(record, query) && record.cached_response.is_none()));
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        let mut state = self.lock_state();
        let before = state.idempotency.len();
        state.idempotency.retain(|record| !record.is_expired(now));
        Ok(removed_count(before, state.idempotency.len()))
    }
}
