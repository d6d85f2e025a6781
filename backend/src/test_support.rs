//! In-memory adapters and service wiring for tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration suites under `tests/`.

mod clock;
mod memory_store;
mod recording;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use clock::MutableClock;
pub use memory_store::InMemoryPayrollStore;
pub use recording::{RecordingEvents, RecordingRenderer};

use crate::domain::idempotency::IdempotencyConfig;
use crate::domain::{
    IdempotencyGuard, PayrollCollaborators, PayrollInputService, PayrollPeriodService,
    PayrollRepositories, PayslipService,
};
use crate::inbound::http::state::HttpState;

/// Real domain services wired to in-memory adapters.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use payroll::test_support::PayrollHarness;
///
/// let harness = PayrollHarness::new(Utc::now());
/// let _state = harness.http_state();
/// ```
pub struct PayrollHarness {
    /// Shared repository state.
    pub store: InMemoryPayrollStore,
    /// Renderer double.
    pub renderer: RecordingRenderer,
    /// Notifier and audit double.
    pub events: RecordingEvents,
    /// Clock handed to every service.
    pub clock: Arc<MutableClock>,
    idempotency: IdempotencyConfig,
}

impl PayrollHarness {
    /// Empty store, healthy renderer and a clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            store: InMemoryPayrollStore::new(),
            renderer: RecordingRenderer::new(),
            events: RecordingEvents::new(),
            clock: Arc::new(MutableClock::new(now)),
            idempotency: IdempotencyConfig::default(),
        }
    }

    /// Override the idempotency TTL.
    #[must_use]
    pub fn with_idempotency(mut self, config: IdempotencyConfig) -> Self {
        self.idempotency = config;
        self
    }

    /// Repository bundle backed by the store.
    pub fn repositories(&self) -> PayrollRepositories {
        let store = Arc::new(self.store.clone());
        PayrollRepositories {
            periods: store.clone(),
            results: store.clone(),
            inputs: store.clone(),
            employees: store.clone(),
            leave: store.clone(),
            payslips: store,
        }
    }

    /// Lifecycle service with an idempotency guard over the store.
    pub fn period_service(&self) -> PayrollPeriodService {
        let events = Arc::new(self.events.clone());
        PayrollPeriodService::new(
            self.repositories(),
            PayrollCollaborators {
                renderer: Arc::new(self.renderer.clone()),
                notifier: events.clone(),
                audit: events,
            },
            IdempotencyGuard::new(
                Arc::new(self.store.clone()),
                self.clock.clone(),
                self.idempotency,
            ),
            self.clock.clone(),
        )
    }

    /// Input service over the store.
    pub fn input_service(&self) -> PayrollInputService {
        PayrollInputService::new(self.repositories())
    }

    /// Payslip service over the store and renderer double.
    pub fn payslip_service(&self) -> PayslipService {
        PayslipService::new(
            self.repositories(),
            Arc::new(self.renderer.clone()),
            self.clock.clone(),
        )
    }

    /// Handler state wired to the real services.
    pub fn http_state(&self) -> HttpState {
        let periods = Arc::new(self.period_service());
        HttpState::new(
            periods.clone(),
            periods,
            Arc::new(self.input_service()),
            Arc::new(self.payslip_service()),
        )
    }
}
