//! Pay element catalog, input and adjustment service.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::payroll::{
    AdjustmentDraft, EmployeeLocator, ImportRow, InputValidationError, PayElement,
    PayElementDraft, PayElementValidationError, PayPeriod, PayrollAdjustment, PayrollInput,
    PayrollInputDraft, PeriodStatus, RowRejection, parse_input_csv,
};
use crate::domain::payroll_period_service::PayrollRepositories;
use crate::domain::ports::{ImportOutcome, PayrollInputCommand};
use crate::domain::service_support::{
    field_error, load_period, map_directory_error, map_input_error,
};
use crate::domain::{ActorContext, Error, TenantId};

fn element_error(error: PayElementValidationError) -> Error {
    let code = match error {
        PayElementValidationError::EmptyName => "required",
        PayElementValidationError::NameTooLong { .. } => "too_long",
    };
    field_error("name", code, error.to_string())
}

fn input_error(error: InputValidationError) -> Error {
    match error {
        InputValidationError::NegativeUnits => field_error("units", "negative", error.to_string()),
        InputValidationError::EmptyDescription => {
            field_error("description", "required", error.to_string())
        }
        InputValidationError::OutOfRange { field } => {
            field_error(field, "out_of_range", error.to_string())
        }
    }
}

/// Resolution caches for one import so repeated references hit the
/// directory once.
#[derive(Default)]
struct ImportResolver {
    employees: HashMap<Uuid, bool>,
    emails: HashMap<String, Option<Uuid>>,
    elements: HashMap<Uuid, bool>,
}

/// Service implementing [`PayrollInputCommand`].
#[derive(Clone)]
pub struct PayrollInputService {
    repos: PayrollRepositories,
}

impl PayrollInputService {
    /// Create the service.
    pub fn new(repos: PayrollRepositories) -> Self {
        Self { repos }
    }

    /// Load a period whose inputs may still change.
    ///
    /// Only drafts accept changes; a reviewed period already holds results
    /// that a later finalize would commit without them.
    async fn open_period(&self, actor: &ActorContext, period_id: Uuid) -> Result<PayPeriod, Error> {
        let period = load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        if period.status != PeriodStatus::Draft {
            return Err(Error::invalid_state_transition(
                "inputs can only change while the pay period is draft",
            )
            .with_details(json!({ "status": period.status.as_str() })));
        }
        Ok(period)
    }

    async fn require_employee(&self, tenant_id: &TenantId, employee_id: Uuid) -> Result<(), Error> {
        let exists = self
            .repos
            .employees
            .employee_exists(tenant_id, employee_id)
            .await
            .map_err(map_directory_error)?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("employee {employee_id} not found")))
        }
    }

    async fn require_element(&self, tenant_id: &TenantId, element_id: Uuid) -> Result<(), Error> {
        self.repos
            .inputs
            .find_element(tenant_id, element_id)
            .await
            .map_err(map_input_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("pay element {element_id} not found")))
    }

    async fn resolve_row(
        &self,
        tenant_id: &TenantId,
        resolver: &mut ImportResolver,
        row: &ImportRow,
    ) -> Result<Result<Uuid, RowRejection>, Error> {
        let employee_id = match &row.employee {
            EmployeeLocator::Id(id) => {
                let known = match resolver.employees.get(id) {
                    Some(known) => *known,
                    None => {
                        let known = self
                            .repos
                            .employees
                            .employee_exists(tenant_id, *id)
                            .await
                            .map_err(map_directory_error)?;
                        resolver.employees.insert(*id, known);
                        known
                    }
                };
                known.then_some(*id)
            }
            EmployeeLocator::Email(email) => match resolver.emails.get(email) {
                Some(found) => *found,
                None => {
                    let found = self
                        .repos
                        .employees
                        .find_employee_id_by_email(tenant_id, email)
                        .await
                        .map_err(map_directory_error)?;
                    resolver.emails.insert(email.clone(), found);
                    found
                }
            },
        };
        let Some(employee_id) = employee_id else {
            return Ok(Err(RowRejection::UnknownEmployee));
        };

        let element_known = match resolver.elements.get(&row.element_id) {
            Some(known) => *known,
            None => {
                let known = self
                    .repos
                    .inputs
                    .find_element(tenant_id, row.element_id)
                    .await
                    .map_err(map_input_error)?
                    .is_some();
                resolver.elements.insert(row.element_id, known);
                known
            }
        };
        if !element_known {
            return Ok(Err(RowRejection::UnknownElement));
        }
        Ok(Ok(employee_id))
    }
}

#[async_trait]
impl PayrollInputCommand for PayrollInputService {
    async fn create_element(
        &self,
        actor: &ActorContext,
        draft: PayElementDraft,
    ) -> Result<PayElement, Error> {
        let element = PayElement::create(actor.tenant_id().clone(), draft).map_err(element_error)?;
        self.repos
            .inputs
            .create_element(&element)
            .await
            .map_err(map_input_error)?;
        info!(tenant_id = %actor.tenant_id(), element_id = %element.id, "pay element created");
        Ok(element)
    }

    async fn list_elements(&self, actor: &ActorContext) -> Result<Vec<PayElement>, Error> {
        self.repos
            .inputs
            .list_elements(actor.tenant_id())
            .await
            .map_err(map_input_error)
    }

    async fn add_input(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        draft: PayrollInputDraft,
    ) -> Result<Uuid, Error> {
        self.open_period(actor, period_id).await?;
        self.require_employee(actor.tenant_id(), draft.employee_id)
            .await?;
        self.require_element(actor.tenant_id(), draft.element_id)
            .await?;
        let input =
            PayrollInput::ingest(actor.tenant_id().clone(), period_id, draft).map_err(input_error)?;
        self.repos
            .inputs
            .add_input(&input)
            .await
            .map_err(map_input_error)?;
        Ok(input.id)
    }

    async fn import_inputs(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        body: String,
    ) -> Result<ImportOutcome, Error> {
        self.open_period(actor, period_id).await?;
        let parsed = parse_input_csv(&body).map_err(|err| Error::invalid_request(err.to_string()))?;

        let tenant_id = actor.tenant_id();
        let mut outcome = ImportOutcome {
            imported: 0,
            skipped: parsed.rejected.len(),
        };
        for (line, rejection) in &parsed.rejected {
            debug!(line, reason = %rejection, "import row skipped");
        }

        let mut resolver = ImportResolver::default();
        for row in parsed.rows {
            let employee_id = match self.resolve_row(tenant_id, &mut resolver, &row).await? {
                Ok(employee_id) => employee_id,
                Err(rejection) => {
                    debug!(line = row.line, reason = %rejection, "import row skipped");
                    outcome.skipped += 1;
                    continue;
                }
            };
            let draft = PayrollInputDraft {
                employee_id,
                element_id: row.element_id,
                units: row.units,
                rate: row.rate,
                amount: row.amount,
                source: row.source,
            };
            let input = match PayrollInput::ingest(tenant_id.clone(), period_id, draft) {
                Ok(input) => input,
                Err(err) => {
                    debug!(line = row.line, reason = %err, "import row skipped");
                    outcome.skipped += 1;
                    continue;
                }
            };
            self.repos
                .inputs
                .add_input(&input)
                .await
                .map_err(map_input_error)?;
            outcome.imported += 1;
        }

        info!(
            %tenant_id,
            %period_id,
            imported = outcome.imported,
            skipped = outcome.skipped,
            "payroll input import finished"
        );
        Ok(outcome)
    }

    async fn add_adjustment(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        draft: AdjustmentDraft,
    ) -> Result<Uuid, Error> {
        self.open_period(actor, period_id).await?;
        self.require_employee(actor.tenant_id(), draft.employee_id)
            .await?;
        let adjustment = PayrollAdjustment::record(actor.tenant_id().clone(), period_id, draft)
            .map_err(input_error)?;
        self.repos
            .inputs
            .add_adjustment(&adjustment)
            .await
            .map_err(map_input_error)?;
        Ok(adjustment.id)
    }

    async fn delete_adjustment(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<(), Error> {
        self.open_period(actor, period_id).await?;
        let deleted = self
            .repos
            .inputs
            .delete_adjustment(actor.tenant_id(), period_id, adjustment_id)
            .await
            .map_err(map_input_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "adjustment {adjustment_id} not found"
            )))
        }
    }
}

#[cfg(test)]
#[path = "payroll_input_service_tests.rs"]
mod tests;
