//! Lifecycle service tests over mocked ports.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::idempotency::IdempotencyConfig;
use crate::domain::payroll::{ClassifiedInput, ElementType, PayslipRenderPayload, UnpaidLeaveSpan};
use crate::domain::ports::{
    EmployeeDirectoryError, MockEmployeeDirectory, MockIdempotencyRepository, MockLeaveRepository,
    MockPayPeriodRepository, MockPayrollAuditLog, MockPayrollInputRepository,
    MockPayrollNotifier, MockPayrollResultRepository, MockPayslipRenderer,
    MockPayslipRepository, PayrollAuditLogError, PayrollNotifierError, ReopenedArtifacts,
};
use crate::domain::{TenantId, UserId};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).expect("valid date")
}

#[derive(Default)]
struct Mocks {
    periods: MockPayPeriodRepository,
    results: MockPayrollResultRepository,
    inputs: MockPayrollInputRepository,
    employees: MockEmployeeDirectory,
    leave: MockLeaveRepository,
    payslips: MockPayslipRepository,
    renderer: MockPayslipRenderer,
    notifier: MockPayrollNotifier,
    audit: MockPayrollAuditLog,
    idempotency: MockIdempotencyRepository,
}

impl Mocks {
    fn with_period(mut self, period: PayPeriod) -> Self {
        self.periods
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(period.clone())));
        self
    }

    fn into_service(self) -> PayrollPeriodService {
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock(now()));
        let guard = IdempotencyGuard::new(
            Arc::new(self.idempotency),
            Arc::clone(&clock),
            IdempotencyConfig::default(),
        );
        PayrollPeriodService::new(
            PayrollRepositories {
                periods: Arc::new(self.periods),
                results: Arc::new(self.results),
                inputs: Arc::new(self.inputs),
                employees: Arc::new(self.employees),
                leave: Arc::new(self.leave),
                payslips: Arc::new(self.payslips),
            },
            PayrollCollaborators {
                renderer: Arc::new(self.renderer),
                notifier: Arc::new(self.notifier),
                audit: Arc::new(self.audit),
            },
            guard,
            clock,
        )
    }
}

#[fixture]
fn actor() -> ActorContext {
    ActorContext::new(TenantId::random(), UserId::random())
}

fn period(actor: &ActorContext, status: PeriodStatus) -> PayPeriod {
    let bounds = PeriodBounds::new(day(1), day(30)).expect("valid bounds");
    PayPeriod {
        status,
        ..PayPeriod::draft(actor.tenant_id().clone(), Uuid::new_v4(), bounds)
    }
}

fn profile(base_salary: Option<Decimal>, has_bank_account: bool) -> EmployeePayProfile {
    EmployeePayProfile {
        employee_id: Uuid::new_v4(),
        first_name: "Grace".to_owned(),
        last_name: "Hopper".to_owned(),
        email: "grace@example.com".to_owned(),
        base_salary,
        currency: "USD".to_owned(),
        has_bank_account,
    }
}

fn payslip(period: &PayPeriod) -> Payslip {
    Payslip {
        id: Uuid::new_v4(),
        tenant_id: period.tenant_id.clone(),
        period_id: period.id,
        employee_id: Uuid::new_v4(),
        file_ref: None,
        created_at: now(),
    }
}

#[rstest]
#[tokio::test]
async fn create_rejects_inverted_dates(actor: ActorContext) {
    let mut mocks = Mocks::default();
    mocks.periods.expect_create().times(0);

    let error = mocks
        .into_service()
        .create_period(
            &actor,
            CreatePeriodRequest {
                schedule_id: Uuid::new_v4(),
                start_date: day(30),
                end_date: day(1),
            },
        )
        .await
        .expect_err("inverted dates");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details(),
        Some(&json!({"field": "startDate", "code": "invalid_dates"}))
    );
}

#[rstest]
#[tokio::test]
async fn create_inserts_a_draft_for_the_tenant(actor: ActorContext) {
    let tenant = actor.tenant_id().clone();
    let mut mocks = Mocks::default();
    mocks
        .periods
        .expect_create()
        .times(1)
        .withf(move |period| period.status == PeriodStatus::Draft && period.tenant_id == tenant)
        .returning(|_| Ok(()));

    let created = mocks
        .into_service()
        .create_period(
            &actor,
            CreatePeriodRequest {
                schedule_id: Uuid::new_v4(),
                start_date: day(1),
                end_date: day(30),
            },
        )
        .await
        .expect("period created");

    assert!(!created.id.is_nil());
}

#[rstest]
#[case(PeriodStatus::Reviewed)]
#[case(PeriodStatus::Finalized)]
#[tokio::test]
async fn run_outside_draft_changes_nothing(actor: ActorContext, #[case] status: PeriodStatus) {
    let mut mocks = Mocks::default().with_period(period(&actor, status));
    mocks.employees.expect_list_active_profiles().times(0);
    mocks.results.expect_upsert_result().times(0);
    mocks.periods.expect_transition_status().times(0);

    let error = mocks
        .into_service()
        .run_period(&actor, Uuid::new_v4())
        .await
        .expect_err("run requires draft");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
}

#[rstest]
#[tokio::test]
async fn run_records_soft_failures_and_moves_to_reviewed(actor: ActorContext) {
    let draft = period(&actor, PeriodStatus::Draft);
    let paid = profile(Some(dec!(1000)), false);
    let unpaid = profile(None, true);
    let paid_id = paid.employee_id;
    let unpaid_id = unpaid.employee_id;

    let mut mocks = Mocks::default().with_period(draft);
    mocks
        .employees
        .expect_list_active_profiles()
        .return_once(move |_| Ok(vec![paid, unpaid]));
    mocks.inputs.expect_list_classified_inputs().returning(|_, _, _| {
        Ok(vec![
            ClassifiedInput {
                element_type: Some(ElementType::Earning),
                amount: dec!(200),
            },
            ClassifiedInput {
                element_type: Some(ElementType::Deduction),
                amount: dec!(100),
            },
        ])
    });
    mocks
        .inputs
        .expect_list_adjustments()
        .returning(|_, _, _| Ok(Vec::new()));
    mocks
        .leave
        .expect_unpaid_leave_overlapping()
        .returning(|_, _, _| Ok(Vec::new()));
    mocks
        .results
        .expect_latest_finalized_net()
        .returning(|_, _, _| Ok(None));
    mocks
        .results
        .expect_upsert_result()
        .times(1)
        .withf(move |result| {
            result.employee_id == paid_id
                && result.gross == dec!(1200)
                && result.deductions == dec!(100)
                && result.net == dec!(1100)
                && result.warnings == BTreeSet::from([WarningCode::MissingBankAccount])
        })
        .returning(|_| Ok(()));
    mocks
        .results
        .expect_replace_run_failures()
        .times(1)
        .withf(move |_, _, failures| {
            failures.len() == 1
                && failures[0].employee_id == unpaid_id
                && failures[0].code == WarningCode::CalculationFailed
        })
        .returning(|_, _, _| Ok(()));
    mocks
        .periods
        .expect_transition_status()
        .times(1)
        .withf(|_, _, from, to| *from == PeriodStatus::Draft && *to == PeriodStatus::Reviewed)
        .returning(|_, _, _, _| Ok(true));

    let response = mocks
        .into_service()
        .run_period(&actor, Uuid::new_v4())
        .await
        .expect("run succeeds");

    assert_eq!(response.status, PeriodStatus::Reviewed);
}

#[rstest]
#[tokio::test]
async fn run_treats_invalid_leave_as_a_soft_failure(actor: ActorContext) {
    let mut mocks = Mocks::default().with_period(period(&actor, PeriodStatus::Draft));
    let employee = profile(Some(dec!(3000)), true);
    mocks
        .employees
        .expect_list_active_profiles()
        .return_once(move |_| Ok(vec![employee]));
    mocks
        .inputs
        .expect_list_classified_inputs()
        .returning(|_, _, _| Ok(Vec::new()));
    mocks
        .inputs
        .expect_list_adjustments()
        .returning(|_, _, _| Ok(Vec::new()));
    mocks.leave.expect_unpaid_leave_overlapping().returning(|_, _, _| {
        Ok(vec![UnpaidLeaveSpan {
            start_date: day(10),
            end_date: day(10),
            start_half: true,
            end_half: true,
        }])
    });
    mocks.results.expect_upsert_result().times(0);
    mocks
        .results
        .expect_replace_run_failures()
        .times(1)
        .withf(|_, _, failures| {
            failures.len() == 1 && failures[0].message.starts_with("invalid leave data")
        })
        .returning(|_, _, _| Ok(()));
    mocks
        .periods
        .expect_transition_status()
        .returning(|_, _, _, _| Ok(true));

    mocks
        .into_service()
        .run_period(&actor, Uuid::new_v4())
        .await
        .expect("run completes despite bad leave data");
}

#[rstest]
#[tokio::test]
async fn run_fails_when_employee_directory_is_down(actor: ActorContext) {
    let mut mocks = Mocks::default().with_period(period(&actor, PeriodStatus::Draft));
    mocks
        .employees
        .expect_list_active_profiles()
        .returning(|_| Err(EmployeeDirectoryError::connection("refused")));
    mocks.periods.expect_transition_status().times(0);

    let error = mocks
        .into_service()
        .run_period(&actor, Uuid::new_v4())
        .await
        .expect_err("directory unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn finalize_renders_and_notifies_after_commit(actor: ActorContext) {
    let reviewed = period(&actor, PeriodStatus::Reviewed);
    let slips = vec![payslip(&reviewed), payslip(&reviewed)];
    let returned = slips.clone();

    let mut mocks = Mocks::default().with_period(reviewed.clone());
    mocks
        .periods
        .expect_finalize()
        .times(1)
        .withf(|_, _, at| *at == now())
        .return_once(move |_, _, _| Ok(Some(returned)));
    mocks.payslips.expect_render_payload().returning(move |_, id| {
        Ok(Some(PayslipRenderPayload {
            payslip_id: id,
            employee_id: Uuid::new_v4(),
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            email: "grace@example.com".to_owned(),
            period_start: day(1),
            period_end: day(30),
            gross: dec!(1200),
            deductions: dec!(100),
            net: dec!(1100),
            currency: "USD".to_owned(),
        }))
    });
    mocks
        .payslips
        .expect_set_file_ref()
        .times(2)
        .returning(|_, _, _| Ok(true));
    mocks
        .renderer
        .expect_render()
        .times(2)
        .returning(|payload| Ok(format!("payslips/{}.pdf", payload.payslip_id)));
    mocks
        .notifier
        .expect_payslip_available()
        .times(2)
        .returning(|_| Err(PayrollNotifierError::delivery("mailbox full")));

    let response = mocks
        .into_service()
        .finalize_period(
            &actor,
            FinalizePeriodRequest {
                period_id: reviewed.id,
                idempotency_key: None,
            },
        )
        .await
        .expect("notification failures are not fatal");

    assert_eq!(response.response.status, PeriodStatus::Finalized);
    assert!(!response.replayed);
}

#[rstest]
#[tokio::test]
async fn finalize_requires_a_reviewed_period(actor: ActorContext) {
    let mut mocks = Mocks::default().with_period(period(&actor, PeriodStatus::Draft));
    mocks.periods.expect_finalize().times(0);
    mocks.notifier.expect_payslip_available().times(0);

    let error = mocks
        .into_service()
        .finalize_period(
            &actor,
            FinalizePeriodRequest {
                period_id: Uuid::new_v4(),
                idempotency_key: None,
            },
        )
        .await
        .expect_err("draft cannot be finalized");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(error.message(), "cannot finalize a draft pay period");
}

#[rstest]
#[tokio::test]
async fn finalize_lost_to_a_concurrent_caller_reports_current_status(actor: ActorContext) {
    let reviewed = period(&actor, PeriodStatus::Reviewed);
    let finalized = PayPeriod {
        status: PeriodStatus::Finalized,
        ..reviewed.clone()
    };
    let mut mocks = Mocks::default();
    let mut seen = 0;
    mocks.periods.expect_find_by_id().returning(move |_, _| {
        seen += 1;
        Ok(Some(if seen == 1 {
            reviewed.clone()
        } else {
            finalized.clone()
        }))
    });
    mocks
        .periods
        .expect_finalize()
        .returning(|_, _, _| Ok(None));
    mocks.notifier.expect_payslip_available().times(0);

    let error = mocks
        .into_service()
        .finalize_period(
            &actor,
            FinalizePeriodRequest {
                period_id: Uuid::new_v4(),
                idempotency_key: None,
            },
        )
        .await
        .expect_err("lost race");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(error.message(), "cannot finalize a finalized pay period");
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn reopen_requires_a_reason(actor: ActorContext, #[case] reason: &str) {
    let mut mocks = Mocks::default();
    mocks.periods.expect_find_by_id().times(0);
    mocks.periods.expect_reopen().times(0);

    let error = mocks
        .into_service()
        .reopen_period(&actor, Uuid::new_v4(), reason.to_owned())
        .await
        .expect_err("reason required");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn reopen_resets_and_audits_even_when_audit_fails(actor: ActorContext) {
    let finalized = period(&actor, PeriodStatus::Finalized);
    let user = actor.user_id().clone();
    let mut mocks = Mocks::default().with_period(finalized.clone());
    mocks.periods.expect_reopen().times(1).returning(|_, _| {
        Ok(Some(ReopenedArtifacts {
            results_deleted: 3,
            failures_deleted: 1,
            payslips_deleted: 3,
        }))
    });
    mocks
        .audit
        .expect_period_reopened()
        .times(1)
        .withf(move |event| {
            event.reason == "wrong overtime rate"
                && event.user_id == user
                && event.results_deleted == 3
                && event.occurred_at == now()
        })
        .returning(|_| Err(PayrollAuditLogError::write("sink offline")));

    let response = mocks
        .into_service()
        .reopen_period(&actor, finalized.id, "  wrong overtime rate ".to_owned())
        .await
        .expect("reopen succeeds");

    assert_eq!(response.status, PeriodStatus::Draft);
}

#[rstest]
#[tokio::test]
async fn reopen_of_reviewed_period_is_rejected(actor: ActorContext) {
    let mut mocks = Mocks::default().with_period(period(&actor, PeriodStatus::Reviewed));
    mocks.periods.expect_reopen().times(0);
    mocks.audit.expect_period_reopened().times(0);

    let error = mocks
        .into_service()
        .reopen_period(&actor, Uuid::new_v4(), "mistake".to_owned())
        .await
        .expect_err("reopen requires finalized");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
}

#[rstest]
#[tokio::test]
async fn summary_of_unknown_period_is_not_found(actor: ActorContext) {
    let mut mocks = Mocks::default();
    mocks.periods.expect_find_by_id().returning(|_, _| Ok(None));
    mocks.results.expect_list_results().times(0);

    let error = mocks
        .into_service()
        .summary(&actor, Uuid::new_v4())
        .await
        .expect_err("unknown period");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn journal_export_uses_summary_totals(actor: ActorContext) {
    let reviewed = period(&actor, PeriodStatus::Reviewed);
    let tenant = actor.tenant_id().clone();
    let period_id = reviewed.id;
    let mut mocks = Mocks::default().with_period(reviewed);
    mocks.results.expect_list_results().returning(move |_, _| {
        Ok(vec![PayrollResult {
            tenant_id: tenant.clone(),
            period_id,
            employee_id: Uuid::new_v4(),
            gross: dec!(1200),
            deductions: dec!(100),
            net: dec!(1100),
            currency: "USD".to_owned(),
            warnings: BTreeSet::new(),
        }])
    });
    mocks
        .results
        .expect_list_run_failures()
        .returning(|_, _| Ok(Vec::new()));

    let csv = mocks
        .into_service()
        .export_journal(&actor, period_id)
        .await
        .expect("journal export");

    assert_eq!(
        csv,
        "account,debit,credit\nsalary_expense,1200,\ndeductions_payable,,100\ncash,,1100\n"
    );
}
