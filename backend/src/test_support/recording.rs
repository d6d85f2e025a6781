//! Recording doubles for the renderer, notifier and audit ports.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::payroll::PayslipRenderPayload;
use crate::domain::ports::{
    PayrollAuditLog, PayrollAuditLogError, PayrollNotifier, PayrollNotifierError,
    PayslipNotification, PayslipRenderer, PayslipRendererError, PeriodReopenedEvent,
};

/// Renderer that counts calls and can be switched into an outage.
///
/// Each render returns `payslips/<id>-<n>.pdf`, so a re-render produces a
/// distinguishable reference.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl RecordingRenderer {
    /// Create a healthy renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of render attempts so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent renders fail as unavailable, or recover.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl PayslipRenderer for RecordingRenderer {
    async fn render(&self, payload: &PayslipRenderPayload) -> Result<String, PayslipRendererError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PayslipRendererError::unavailable("renderer offline"));
        }
        Ok(format!("payslips/{}-{call}.pdf", payload.payslip_id))
    }
}

#[derive(Default)]
struct RecordedEvents {
    notifications: Vec<PayslipNotification>,
    reopened: Vec<PeriodReopenedEvent>,
}

/// Notifier and audit log that keep every event in memory.
#[derive(Clone, Default)]
pub struct RecordingEvents {
    events: Arc<Mutex<RecordedEvents>>,
}

impl RecordingEvents {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_events(&self) -> MutexGuard<'_, RecordedEvents> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("recorded events mutex"),
        }
    }

    /// Payslip notifications sent so far.
    pub fn notifications(&self) -> Vec<PayslipNotification> {
        self.lock_events().notifications.clone()
    }

    /// Reopen audit entries written so far.
    pub fn reopened(&self) -> Vec<PeriodReopenedEvent> {
        self.lock_events().reopened.clone()
    }
}

#[async_trait]
impl PayrollNotifier for RecordingEvents {
    async fn payslip_available(
        &self,
        notification: &PayslipNotification,
    ) -> Result<(), PayrollNotifierError> {
        self.lock_events().notifications.push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl PayrollAuditLog for RecordingEvents {
    async fn period_reopened(
        &self,
        event: &PeriodReopenedEvent,
    ) -> Result<(), PayrollAuditLogError> {
        self.lock_events().reopened.push(event.clone());
        Ok(())
    }
}
