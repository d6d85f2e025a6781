//! HTTP inbound adapter exposing REST endpoints.

pub mod actor;
pub mod elements;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod payslips;
pub mod periods;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
