//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixturePayrollInputCommand, FixturePayrollPeriodCommand, FixturePayrollPeriodQuery,
    FixturePayslipCommand, PayrollInputCommand, PayrollPeriodCommand, PayrollPeriodQuery,
    PayslipCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Period lifecycle mutations.
    pub periods: Arc<dyn PayrollPeriodCommand>,
    /// Period read models and exports.
    pub period_queries: Arc<dyn PayrollPeriodQuery>,
    /// Element catalog, inputs and adjustments.
    pub inputs: Arc<dyn PayrollInputCommand>,
    /// Payslip listing and documents.
    pub payslips: Arc<dyn PayslipCommand>,
}

impl HttpState {
    /// Construct state from the driving ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use payroll::domain::ports::{
    ///     FixturePayrollInputCommand, FixturePayrollPeriodCommand, FixturePayrollPeriodQuery,
    ///     FixturePayslipCommand,
    /// };
    /// use payroll::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixturePayrollPeriodCommand),
    ///     Arc::new(FixturePayrollPeriodQuery),
    ///     Arc::new(FixturePayrollInputCommand),
    ///     Arc::new(FixturePayslipCommand),
    /// );
    /// let _periods = state.periods.clone();
    /// ```
    pub fn new(
        periods: Arc<dyn PayrollPeriodCommand>,
        period_queries: Arc<dyn PayrollPeriodQuery>,
        inputs: Arc<dyn PayrollInputCommand>,
        payslips: Arc<dyn PayslipCommand>,
    ) -> Self {
        Self {
            periods,
            period_queries,
            inputs,
            payslips,
        }
    }

    /// Replace the lifecycle port.
    #[must_use]
    pub fn with_periods(mut self, periods: Arc<dyn PayrollPeriodCommand>) -> Self {
        self.periods = periods;
        self
    }

    /// Replace the read-model port.
    #[must_use]
    pub fn with_period_queries(mut self, period_queries: Arc<dyn PayrollPeriodQuery>) -> Self {
        self.period_queries = period_queries;
        self
    }

    /// Replace the input port.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Arc<dyn PayrollInputCommand>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Replace the payslip port.
    #[must_use]
    pub fn with_payslips(mut self, payslips: Arc<dyn PayslipCommand>) -> Self {
        self.payslips = payslips;
        self
    }
}

impl Default for HttpState {
    /// Fixture ports that validate requests but persist nothing.
    fn default() -> Self {
        Self::new(
            Arc::new(FixturePayrollPeriodCommand),
            Arc::new(FixturePayrollPeriodQuery),
            Arc::new(FixturePayrollInputCommand),
            Arc::new(FixturePayslipCommand),
        )
    }
}
