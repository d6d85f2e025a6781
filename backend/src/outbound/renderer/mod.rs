//! Payslip document renderer adapters.
//!
//! This module provides a thin HTTP implementation of the `PayslipRenderer`
//! port.

mod dto;
mod http_renderer;

pub use http_renderer::{HttpPayslipRenderer, RendererBuildError};
