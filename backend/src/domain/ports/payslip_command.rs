//! Driving port for payslip listing and document materialization.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payroll::{Payslip, PayslipFilter};
use crate::domain::{ActorContext, Error};

/// Counts reported by a payslip generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayslipsResponse {
    /// Payslip rows created.
    pub created: usize,
    /// Documents rendered.
    pub rendered: usize,
}

/// Rendered document reference for a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayslipDownload {
    /// Payslip identifier.
    pub payslip_id: Uuid,
    /// Stored document reference.
    pub file_ref: String,
}

/// Driving port for payslips.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayslipCommand: Send + Sync {
    /// Payslips matching the filter.
    async fn list_payslips(
        &self,
        actor: &ActorContext,
        filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, Error>;

    /// Create missing payslips of a finalized period and render missing
    /// documents.
    async fn generate_payslips(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<GeneratePayslipsResponse, Error>;

    /// Document reference, rendering it first when absent.
    async fn download(
        &self,
        actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error>;

    /// Re-render and overwrite the document reference.
    async fn regenerate(
        &self,
        actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error>;
}

/// Fixture with no payslips.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayslipCommand;

#[async_trait]
impl PayslipCommand for FixturePayslipCommand {
    async fn list_payslips(
        &self,
        _actor: &ActorContext,
        _filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, Error> {
        Ok(Vec::new())
    }

    async fn generate_payslips(
        &self,
        _actor: &ActorContext,
        _period_id: Uuid,
    ) -> Result<GeneratePayslipsResponse, Error> {
        Ok(GeneratePayslipsResponse::default())
    }

    async fn download(
        &self,
        _actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error> {
        Err(Error::not_found(format!("payslip {payslip_id} not found")))
    }

    async fn regenerate(
        &self,
        _actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error> {
        Err(Error::not_found(format!("payslip {payslip_id} not found")))
    }
}
