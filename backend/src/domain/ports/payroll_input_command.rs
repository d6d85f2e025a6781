//! Driving port for the pay element catalog, inputs and adjustments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payroll::{
    AdjustmentDraft, PayElement, PayElementDraft, PayrollInputDraft, parse_input_csv,
};
use crate::domain::{ActorContext, Error};

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Rows stored.
    pub imported: usize,
    /// Rows skipped.
    pub skipped: usize,
}

/// Driving port for mutable payroll inputs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayrollInputCommand: Send + Sync {
    /// Define a catalog element.
    async fn create_element(
        &self,
        actor: &ActorContext,
        draft: PayElementDraft,
    ) -> Result<PayElement, Error>;

    /// The tenant's catalog.
    async fn list_elements(&self, actor: &ActorContext) -> Result<Vec<PayElement>, Error>;

    /// Append one input line to a period.
    async fn add_input(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        draft: PayrollInputDraft,
    ) -> Result<Uuid, Error>;

    /// Append input lines from a CSV body, skipping unresolvable rows.
    async fn import_inputs(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        body: String,
    ) -> Result<ImportOutcome, Error>;

    /// Record an adjustment.
    async fn add_adjustment(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        draft: AdjustmentDraft,
    ) -> Result<Uuid, Error>;

    /// Remove an adjustment.
    async fn delete_adjustment(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<(), Error>;
}

/// Fixture command that validates shape but stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayrollInputCommand;

#[async_trait]
impl PayrollInputCommand for FixturePayrollInputCommand {
    async fn create_element(
        &self,
        actor: &ActorContext,
        draft: PayElementDraft,
    ) -> Result<PayElement, Error> {
        PayElement::create(actor.tenant_id().clone(), draft)
            .map_err(|err| Error::invalid_request(err.to_string()))
    }

    async fn list_elements(&self, _actor: &ActorContext) -> Result<Vec<PayElement>, Error> {
        Ok(Vec::new())
    }

    async fn add_input(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
        _draft: PayrollInputDraft,
    ) -> Result<Uuid, Error> {
        Ok(Uuid::new_v4())
    }

    async fn import_inputs(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
        body: String,
    ) -> Result<ImportOutcome, Error> {
        let parsed =
            parse_input_csv(&body).map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(ImportOutcome {
            imported: parsed.rows.len(),
            skipped: parsed.rejected.len(),
        })
    }

    async fn add_adjustment(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
        _draft: AdjustmentDraft,
    ) -> Result<Uuid, Error> {
        Ok(Uuid::new_v4())
    }

    async fn delete_adjustment(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
        _adjustment_id: Uuid,
    ) -> Result<(), Error> {
        Ok(())
    }
}
