//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the payroll repository
//! ports backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Lifecycle rules live in the domain.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Guarded writes**: status transitions are conditional updates, and
//!   finalize and reopen touch their side tables in one transaction.
//! - **Strongly typed errors**: pool and Diesel failures map to each port's
//!   `Connection` or `Query` variant.
//!
//! # Example
//!
//! ```ignore
//! use payroll::outbound::persistence::{DbPool, DieselPayPeriodRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/payroll")).await?;
//! let periods = DieselPayPeriodRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_employee_directory;
mod diesel_idempotency_repository;
mod diesel_pay_period_repository;
mod diesel_payroll_input_repository;
mod diesel_payroll_result_repository;
mod diesel_payslip_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_employee_directory::DieselEmployeeDirectory;
pub use diesel_idempotency_repository::DieselIdempotencyRepository;
pub use diesel_pay_period_repository::DieselPayPeriodRepository;
pub use diesel_payroll_input_repository::DieselPayrollInputRepository;
pub use diesel_payroll_result_repository::DieselPayrollResultRepository;
pub use diesel_payslip_repository::DieselPayslipRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
