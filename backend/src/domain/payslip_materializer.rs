//! Turns payslip rows into rendered documents.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::payroll::Payslip;
use crate::domain::ports::{PayslipRenderer, PayslipRepository};
use crate::domain::service_support::{map_payslip_error, map_renderer_error};
use crate::domain::side_effect::{SideEffect, log_side_effect_failure};
use crate::domain::{Error, TenantId};

/// Renders payslips through the external renderer and stores the returned
/// references.
#[derive(Clone)]
pub struct PayslipMaterializer {
    payslips: Arc<dyn PayslipRepository>,
    renderer: Arc<dyn PayslipRenderer>,
}

impl PayslipMaterializer {
    /// Create a materializer.
    pub fn new(payslips: Arc<dyn PayslipRepository>, renderer: Arc<dyn PayslipRenderer>) -> Self {
        Self { payslips, renderer }
    }

    /// Render one payslip and persist its reference.
    pub async fn render(&self, tenant_id: &TenantId, payslip_id: Uuid) -> Result<String, Error> {
        let payload = self
            .payslips
            .render_payload(tenant_id, payslip_id)
            .await
            .map_err(map_payslip_error)?
            .ok_or_else(|| Error::not_found(format!("payslip {payslip_id} not found")))?;
        let file_ref = self
            .renderer
            .render(&payload)
            .await
            .map_err(map_renderer_error)?;
        let stored = self
            .payslips
            .set_file_ref(tenant_id, payslip_id, &file_ref)
            .await
            .map_err(map_payslip_error)?;
        if !stored {
            return Err(Error::not_found(format!("payslip {payslip_id} not found")));
        }
        debug!(%payslip_id, %file_ref, "payslip rendered");
        Ok(file_ref)
    }

    /// Render every payslip lacking a document, continuing past failures.
    ///
    /// Returns how many documents were rendered.
    pub async fn materialize_missing(&self, tenant_id: &TenantId, payslips: &[Payslip]) -> usize {
        let mut rendered = 0;
        for payslip in payslips.iter().filter(|payslip| payslip.file_ref.is_none()) {
            match self.render(tenant_id, payslip.id).await {
                Ok(_) => rendered += 1,
                Err(err) => log_side_effect_failure(
                    SideEffect::PayslipRender,
                    tenant_id,
                    payslip.period_id,
                    Some(payslip.employee_id),
                    &err,
                ),
            }
        }
        if !payslips.is_empty() {
            info!(%tenant_id, rendered, total = payslips.len(), "payslip materialization finished");
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::payroll::PayslipRenderPayload;
    use crate::domain::ports::{
        MockPayslipRenderer, MockPayslipRepository, PayslipRendererError,
    };

    fn payslip(file_ref: Option<&str>) -> Payslip {
        Payslip {
            id: Uuid::new_v4(),
            tenant_id: TenantId::random(),
            period_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            file_ref: file_ref.map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    fn payload(payslip_id: Uuid) -> PayslipRenderPayload {
        let day = |d| NaiveDate::from_ymd_opt(2026, 6, d).expect("valid date");
        PayslipRenderPayload {
            payslip_id,
            employee_id: Uuid::new_v4(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            period_start: day(1),
            period_end: day(30),
            gross: dec!(1200),
            deductions: dec!(100),
            net: dec!(1100),
            currency: "USD".to_owned(),
        }
    }

    #[tokio::test]
    async fn one_failed_render_does_not_stop_the_others() {
        let tenant = TenantId::random();
        let failing = payslip(None);
        let succeeding = payslip(None);
        let already = payslip(Some("payslips/old.pdf"));
        let failing_id = failing.id;

        let mut repo = MockPayslipRepository::new();
        repo.expect_render_payload()
            .times(2)
            .returning(|_, id| Ok(Some(payload(id))));
        repo.expect_set_file_ref()
            .times(1)
            .with(mockall::predicate::always(), eq(succeeding.id), eq("payslips/ok.pdf"))
            .returning(|_, _, _| Ok(true));
        let mut renderer = MockPayslipRenderer::new();
        renderer.expect_render().times(2).returning(move |payload| {
            if payload.payslip_id == failing_id {
                Err(PayslipRendererError::unavailable("timeout"))
            } else {
                Ok("payslips/ok.pdf".to_owned())
            }
        });

        let materializer = PayslipMaterializer::new(Arc::new(repo), Arc::new(renderer));
        let rendered = materializer
            .materialize_missing(&tenant, &[failing, succeeding, already])
            .await;

        assert_eq!(rendered, 1);
    }

    #[tokio::test]
    async fn render_reports_missing_payslip() {
        let mut repo = MockPayslipRepository::new();
        repo.expect_render_payload().returning(|_, _| Ok(None));
        let mut renderer = MockPayslipRenderer::new();
        renderer.expect_render().times(0);

        let materializer = PayslipMaterializer::new(Arc::new(repo), Arc::new(renderer));
        let error = materializer
            .render(&TenantId::random(), Uuid::new_v4())
            .await
            .expect_err("missing payslip");

        assert_eq!(error.code(), crate::domain::ErrorCode::NotFound);
    }
}
