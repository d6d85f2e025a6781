//! Builders for HTTP state from repository-backed payroll services.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use payroll::domain::idempotency::IdempotencyConfig;
use payroll::domain::ports::PayslipRenderer;
use payroll::domain::{
    IdempotencyGuard, PayrollCollaborators, PayrollInputService, PayrollPeriodService,
    PayrollRepositories, PayslipService,
};
use payroll::inbound::http::state::HttpState;
use payroll::outbound::events::TracingPayrollEvents;
use payroll::outbound::persistence::{
    DbPool, DieselEmployeeDirectory, DieselIdempotencyRepository, DieselPayPeriodRepository,
    DieselPayrollInputRepository, DieselPayrollResultRepository, DieselPayslipRepository,
};

use super::ServerConfig;

/// Build the HTTP state using real services when a pool is available,
/// otherwise using fixture implementations.
fn build_state_with_pool<Pool>(
    pool: &Option<Pool>,
    make_state: impl FnOnce(&Pool) -> HttpState,
) -> HttpState {
    match pool {
        Some(pool) => make_state(pool),
        None => HttpState::default(),
    }
}

/// Diesel repositories sharing one pool.
fn build_repositories(pool: &DbPool) -> PayrollRepositories {
    let employees = Arc::new(DieselEmployeeDirectory::new(pool.clone()));
    PayrollRepositories {
        periods: Arc::new(DieselPayPeriodRepository::new(pool.clone())),
        results: Arc::new(DieselPayrollResultRepository::new(pool.clone())),
        inputs: Arc::new(DieselPayrollInputRepository::new(pool.clone())),
        employees: employees.clone(),
        leave: employees,
        payslips: Arc::new(DieselPayslipRepository::new(pool.clone())),
    }
}

/// Wire the payroll services over a repository bundle.
fn build_services(
    repos: &PayrollRepositories,
    guard: IdempotencyGuard,
    renderer: &Arc<dyn PayslipRenderer>,
    clock: &Arc<dyn Clock>,
) -> HttpState {
    let events = Arc::new(TracingPayrollEvents);
    let periods = Arc::new(PayrollPeriodService::new(
        repos.clone(),
        PayrollCollaborators {
            renderer: Arc::clone(renderer),
            notifier: events.clone(),
            audit: events,
        },
        guard,
        Arc::clone(clock),
    ));
    HttpState::new(
        periods.clone(),
        periods,
        Arc::new(PayrollInputService::new(repos.clone())),
        Arc::new(PayslipService::new(
            repos.clone(),
            Arc::clone(renderer),
            Arc::clone(clock),
        )),
    )
}

/// Build the shared HTTP state from configured ports and fixture fallbacks.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = build_state_with_pool(&config.db_pool, |pool| {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let guard = IdempotencyGuard::new(
            Arc::new(DieselIdempotencyRepository::new(pool.clone())),
            Arc::clone(&clock),
            IdempotencyConfig::from_env(),
        );
        build_services(&build_repositories(pool), guard, &config.renderer, &clock)
    });
    web::Data::new(state)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use payroll::domain::identity::{TenantId, UserId};
    use payroll::domain::{ActorContext, ErrorCode};
    use payroll::test_support::PayrollHarness;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn actor() -> ActorContext {
        ActorContext::new(TenantId::random(), UserId::random())
    }

    fn harness_state(harness: &PayrollHarness) -> HttpState {
        let clock: Arc<dyn Clock> = harness.clock.clone();
        let renderer: Arc<dyn PayslipRenderer> = Arc::new(harness.renderer.clone());
        let guard = IdempotencyGuard::new(
            Arc::new(harness.store.clone()),
            Arc::clone(&clock),
            IdempotencyConfig::default(),
        );
        build_services(&harness.repositories(), guard, &renderer, &clock)
    }

    #[rstest]
    #[tokio::test]
    async fn pool_present_selects_repository_backed_services() {
        let harness = PayrollHarness::new(
            Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        );
        let state = build_state_with_pool(&Some(()), |()| harness_state(&harness));

        let error = state
            .period_queries
            .get_period(&actor(), Uuid::new_v4())
            .await
            .expect_err("empty store has no periods");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn pool_absent_keeps_fixture_ports() {
        let state = build_state_with_pool::<()>(&None, |()| {
            panic!("fixture path must not build services")
        });

        let period_id = Uuid::new_v4();
        let period = state
            .period_queries
            .get_period(&actor(), period_id)
            .await
            .expect("fixture period");
        assert_eq!(period.id, period_id);
    }
}
