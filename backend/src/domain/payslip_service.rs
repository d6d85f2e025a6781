//! Payslip listing, generation and document download.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::payroll::{Payslip, PayslipFilter, PeriodStatus};
use crate::domain::payroll_period_service::PayrollRepositories;
use crate::domain::payslip_materializer::PayslipMaterializer;
use crate::domain::ports::{
    GeneratePayslipsResponse, PayslipCommand, PayslipDownload, PayslipRenderer,
};
use crate::domain::service_support::{load_period, map_payslip_error};
use crate::domain::{ActorContext, Error};

/// Service implementing [`PayslipCommand`].
#[derive(Clone)]
pub struct PayslipService {
    repos: PayrollRepositories,
    materializer: PayslipMaterializer,
    clock: Arc<dyn Clock>,
}

impl PayslipService {
    /// Create the service.
    pub fn new(
        repos: PayrollRepositories,
        renderer: Arc<dyn PayslipRenderer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let materializer = PayslipMaterializer::new(Arc::clone(&repos.payslips), renderer);
        Self {
            repos,
            materializer,
            clock,
        }
    }

    async fn find(&self, actor: &ActorContext, payslip_id: Uuid) -> Result<Payslip, Error> {
        self.repos
            .payslips
            .find_by_id(actor.tenant_id(), payslip_id)
            .await
            .map_err(map_payslip_error)?
            .ok_or_else(|| Error::not_found(format!("payslip {payslip_id} not found")))
    }
}

#[async_trait]
impl PayslipCommand for PayslipService {
    async fn list_payslips(
        &self,
        actor: &ActorContext,
        filter: PayslipFilter,
    ) -> Result<Vec<Payslip>, Error> {
        self.repos
            .payslips
            .list(actor.tenant_id(), filter)
            .await
            .map_err(map_payslip_error)
    }

    async fn generate_payslips(
        &self,
        actor: &ActorContext,
        period_id: Uuid,
    ) -> Result<GeneratePayslipsResponse, Error> {
        let period = load_period(self.repos.periods.as_ref(), actor, period_id).await?;
        if period.status != PeriodStatus::Finalized {
            return Err(Error::invalid_state_transition(format!(
                "cannot generate payslips for a {} pay period",
                period.status
            ))
            .with_details(json!({ "status": period.status.as_str() })));
        }

        let created = self
            .repos
            .payslips
            .create_missing_for_period(actor.tenant_id(), period_id, self.clock.utc())
            .await
            .map_err(map_payslip_error)?;
        let payslips = self
            .repos
            .payslips
            .list(
                actor.tenant_id(),
                PayslipFilter {
                    period_id: Some(period_id),
                    employee_id: None,
                },
            )
            .await
            .map_err(map_payslip_error)?;
        let rendered = self
            .materializer
            .materialize_missing(actor.tenant_id(), &payslips)
            .await;

        info!(
            tenant_id = %actor.tenant_id(),
            %period_id,
            created = created.len(),
            rendered,
            "payslip generation finished"
        );
        Ok(GeneratePayslipsResponse {
            created: created.len(),
            rendered,
        })
    }

    async fn download(
        &self,
        actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error> {
        let payslip = self.find(actor, payslip_id).await?;
        let file_ref = match payslip.file_ref {
            Some(file_ref) => file_ref,
            None => self.materializer.render(actor.tenant_id(), payslip_id).await?,
        };
        Ok(PayslipDownload {
            payslip_id,
            file_ref,
        })
    }

    async fn regenerate(
        &self,
        actor: &ActorContext,
        payslip_id: Uuid,
    ) -> Result<PayslipDownload, Error> {
        self.find(actor, payslip_id).await?;
        let file_ref = self.materializer.render(actor.tenant_id(), payslip_id).await?;
        info!(tenant_id = %actor.tenant_id(), %payslip_id, "payslip regenerated");
        Ok(PayslipDownload {
            payslip_id,
            file_ref,
        })
    }
}
