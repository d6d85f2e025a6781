//! Port for the external payslip document renderer.

use async_trait::async_trait;

use crate::domain::payroll::PayslipRenderPayload;

use super::define_port_error;

define_port_error! {
    /// Errors raised by renderer adapters.
    pub enum PayslipRendererError {
        /// The renderer could not be reached or timed out.
        Unavailable { message: String } => "payslip renderer unavailable: {message}",
        /// The renderer answered with an error or an unreadable body.
        Rejected { message: String } => "payslip renderer rejected request: {message}",
    }
}

/// Port turning a render payload into a stored document reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayslipRenderer: Send + Sync {
    /// Render a payslip and return its file reference.
    async fn render(&self, payload: &PayslipRenderPayload) -> Result<String, PayslipRendererError>;
}

/// Renderer that derives a deterministic reference without rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePayslipRenderer;

#[async_trait]
impl PayslipRenderer for FixturePayslipRenderer {
    async fn render(&self, payload: &PayslipRenderPayload) -> Result<String, PayslipRendererError> {
        Ok(format!("payslips/{}.pdf", payload.payslip_id))
    }
}
