//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, renderer, notifier, audit log) are
//! implemented by outbound adapters; driving ports (commands and queries)
//! are implemented by domain services and called from inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod employee_directory;
mod idempotency_repository;
mod pay_period_repository;
mod payroll_events;
mod payroll_input_command;
mod payroll_input_repository;
mod payroll_period_command;
mod payroll_result_repository;
mod payslip_command;
mod payslip_renderer;
mod payslip_repository;

#[cfg(test)]
pub use employee_directory::{MockEmployeeDirectory, MockLeaveRepository};
pub use employee_directory::{EmployeeDirectory, EmployeeDirectoryError, LeaveRepository};
#[cfg(test)]
pub use idempotency_repository::MockIdempotencyRepository;
pub use idempotency_repository::{
    FixtureIdempotencyRepository, IdempotencyRepository, IdempotencyRepositoryError,
};
#[cfg(test)]
pub use pay_period_repository::MockPayPeriodRepository;
pub use pay_period_repository::{PayPeriodRepository, PayPeriodRepositoryError, ReopenedArtifacts};
#[cfg(test)]
pub use payroll_events::{MockPayrollAuditLog, MockPayrollNotifier};
pub use payroll_events::{
    FixturePayrollEvents, PayrollAuditLog, PayrollAuditLogError, PayrollNotifier,
    PayrollNotifierError, PayslipNotification, PeriodReopenedEvent,
};
#[cfg(test)]
pub use payroll_input_command::MockPayrollInputCommand;
pub use payroll_input_command::{FixturePayrollInputCommand, ImportOutcome, PayrollInputCommand};
#[cfg(test)]
pub use payroll_input_repository::MockPayrollInputRepository;
pub use payroll_input_repository::{PayrollInputRepository, PayrollInputRepositoryError};
#[cfg(test)]
pub use payroll_period_command::{MockPayrollPeriodCommand, MockPayrollPeriodQuery};
pub use payroll_period_command::{
    CreatePeriodRequest, CreatedResponse, FinalizePeriodRequest, FinalizePeriodResponse,
    FixturePayrollPeriodCommand, FixturePayrollPeriodQuery, PayrollPeriodCommand,
    PayrollPeriodQuery, PeriodStatusResponse,
};
#[cfg(test)]
pub use payroll_result_repository::MockPayrollResultRepository;
pub use payroll_result_repository::{PayrollResultRepository, PayrollResultRepositoryError};
#[cfg(test)]
pub use payslip_command::MockPayslipCommand;
pub use payslip_command::{
    FixturePayslipCommand, GeneratePayslipsResponse, PayslipCommand, PayslipDownload,
};
#[cfg(test)]
pub use payslip_renderer::MockPayslipRenderer;
pub use payslip_renderer::{FixturePayslipRenderer, PayslipRenderer, PayslipRendererError};
#[cfg(test)]
pub use payslip_repository::MockPayslipRepository;
pub use payslip_repository::{PayslipRepository, PayslipRepositoryError};
