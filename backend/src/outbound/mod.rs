//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **renderer**: HTTP client for the payslip document renderer
//! - **events**: structured-log notifier and audit trail
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod events;
pub mod persistence;
pub mod renderer;
