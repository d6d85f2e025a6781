//! Input service tests over mocked ports.

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::{fixture, rstest};
use rust_decimal_macros::dec;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::payroll::{CalcType, ElementType, InputSource, PeriodBounds};
use crate::domain::ports::{
    MockEmployeeDirectory, MockLeaveRepository, MockPayPeriodRepository,
    MockPayrollInputRepository, MockPayrollResultRepository, MockPayslipRepository,
};
use crate::domain::{TenantId, UserId};

#[derive(Default)]
struct Mocks {
    periods: MockPayPeriodRepository,
    inputs: MockPayrollInputRepository,
    employees: MockEmployeeDirectory,
}

impl Mocks {
    fn with_status(mut self, actor: &ActorContext, status: PeriodStatus) -> Self {
        let day = |d| NaiveDate::from_ymd_opt(2026, 6, d).expect("valid date");
        let bounds = PeriodBounds::new(day(1), day(30)).expect("valid bounds");
        let period = PayPeriod {
            status,
            ..PayPeriod::draft(actor.tenant_id().clone(), Uuid::new_v4(), bounds)
        };
        self.periods
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(period.clone())));
        self
    }

    fn into_service(self) -> PayrollInputService {
        PayrollInputService::new(PayrollRepositories {
            periods: Arc::new(self.periods),
            results: Arc::new(MockPayrollResultRepository::new()),
            inputs: Arc::new(self.inputs),
            employees: Arc::new(self.employees),
            leave: Arc::new(MockLeaveRepository::new()),
            payslips: Arc::new(MockPayslipRepository::new()),
        })
    }
}

#[fixture]
fn actor() -> ActorContext {
    ActorContext::new(TenantId::random(), UserId::random())
}

fn element(tenant_id: &TenantId, id: Uuid) -> PayElement {
    PayElement {
        id,
        tenant_id: tenant_id.clone(),
        name: "Overtime".to_owned(),
        element_type: ElementType::Earning,
        calc_type: CalcType::UnitRate,
        default_amount: dec!(0),
        taxable: true,
    }
}

fn draft(employee_id: Uuid, element_id: Uuid) -> PayrollInputDraft {
    PayrollInputDraft {
        employee_id,
        element_id,
        units: dec!(10),
        rate: dec!(12.5),
        amount: dec!(0),
        source: InputSource::Manual,
    }
}

#[rstest]
#[tokio::test]
async fn create_element_rejects_blank_name(actor: ActorContext) {
    let mut mocks = Mocks::default();
    mocks.inputs.expect_create_element().times(0);

    let error = mocks
        .into_service()
        .create_element(
            &actor,
            PayElementDraft {
                name: "  ".to_owned(),
                element_type: ElementType::Deduction,
                calc_type: CalcType::Fixed,
                default_amount: dec!(25),
                taxable: false,
            },
        )
        .await
        .expect_err("blank name");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details(),
        Some(&json!({"field": "name", "code": "required"}))
    );
}

#[rstest]
#[tokio::test]
async fn add_input_normalises_amount_from_units(actor: ActorContext) {
    let tenant = actor.tenant_id().clone();
    let element_id = Uuid::new_v4();
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_employee_exists()
        .returning(|_, _| Ok(true));
    mocks
        .inputs
        .expect_find_element()
        .returning(move |_, id| Ok(Some(element(&tenant, id))));
    mocks
        .inputs
        .expect_add_input()
        .times(1)
        .withf(|input| input.amount == dec!(125.00) && input.source == InputSource::Manual)
        .returning(|_| Ok(()));

    mocks
        .into_service()
        .add_input(&actor, Uuid::new_v4(), draft(Uuid::new_v4(), element_id))
        .await
        .expect("input stored");
}

#[rstest]
#[tokio::test]
async fn add_input_with_unknown_element_is_not_found(actor: ActorContext) {
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_employee_exists()
        .returning(|_, _| Ok(true));
    mocks.inputs.expect_find_element().returning(|_, _| Ok(None));
    mocks.inputs.expect_add_input().times(0);

    let error = mocks
        .into_service()
        .add_input(&actor, Uuid::new_v4(), draft(Uuid::new_v4(), Uuid::new_v4()))
        .await
        .expect_err("unknown element");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(PeriodStatus::Reviewed)]
#[case(PeriodStatus::Finalized)]
#[tokio::test]
async fn non_draft_period_rejects_new_inputs(actor: ActorContext, #[case] status: PeriodStatus) {
    let mut mocks = Mocks::default().with_status(&actor, status);
    mocks.employees.expect_employee_exists().times(0);
    mocks.inputs.expect_add_input().times(0);

    let error = mocks
        .into_service()
        .add_input(&actor, Uuid::new_v4(), draft(Uuid::new_v4(), Uuid::new_v4()))
        .await
        .expect_err("closed period");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(error.details(), Some(&json!({ "status": status.as_str() })));
}

#[rstest]
#[tokio::test]
async fn reviewed_period_rejects_adjustments(actor: ActorContext) {
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Reviewed);
    mocks.inputs.expect_add_adjustment().times(0);

    let error = mocks
        .into_service()
        .add_adjustment(
            &actor,
            Uuid::new_v4(),
            AdjustmentDraft {
                employee_id: Uuid::new_v4(),
                description: "Late overtime".to_owned(),
                amount: dec!(40),
                effective_date: None,
            },
        )
        .await
        .expect_err("reviewed period");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
}

#[rstest]
#[tokio::test]
async fn oversized_input_is_a_field_error(actor: ActorContext) {
    let tenant = actor.tenant_id().clone();
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_employee_exists()
        .returning(|_, _| Ok(true));
    mocks
        .inputs
        .expect_find_element()
        .returning(move |_, id| Ok(Some(element(&tenant, id))));
    mocks.inputs.expect_add_input().times(0);

    let error = mocks
        .into_service()
        .add_input(
            &actor,
            Uuid::new_v4(),
            PayrollInputDraft {
                units: rust_decimal::Decimal::MAX,
                rate: dec!(2),
                ..draft(Uuid::new_v4(), Uuid::new_v4())
            },
        )
        .await
        .expect_err("units beyond storage");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details(),
        Some(&json!({"field": "units", "code": "out_of_range"}))
    );
}

#[rstest]
#[tokio::test]
async fn import_skips_rows_with_unknown_elements(actor: ActorContext) {
    let tenant = actor.tenant_id().clone();
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();
    let employee = Uuid::new_v4();

    let mut body = String::from("employee_id,element_id,units,rate,amount\n");
    for row in 0..10 {
        let element_id = if row < 8 { known } else { unknown };
        body.push_str(&format!("{employee},{element_id},1,100,\n"));
    }

    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_employee_exists()
        .times(1)
        .returning(|_, _| Ok(true));
    mocks
        .inputs
        .expect_find_element()
        .times(2)
        .returning(move |_, id| Ok((id == known).then(|| element(&tenant, id))));
    mocks
        .inputs
        .expect_add_input()
        .times(8)
        .withf(|input| input.source == InputSource::Import && input.amount == dec!(100.00))
        .returning(|_| Ok(()));

    let outcome = mocks
        .into_service()
        .import_inputs(&actor, Uuid::new_v4(), body)
        .await
        .expect("import succeeds");

    assert_eq!(
        outcome,
        ImportOutcome {
            imported: 8,
            skipped: 2
        }
    );
}

#[rstest]
#[tokio::test]
async fn import_resolves_each_email_once(actor: ActorContext) {
    let tenant = actor.tenant_id().clone();
    let employee = Uuid::new_v4();
    let element_id = Uuid::new_v4();
    let body = format!(
        "Employee_Email,Element_ID,Amount\n\
         Ada@Example.com,{element_id},50\n\
         ada@example.com,{element_id},25\n\
         nobody@example.com,{element_id},10\n"
    );

    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_find_employee_id_by_email()
        .times(2)
        .returning(move |_, email| Ok((email == "ada@example.com").then_some(employee)));
    mocks
        .inputs
        .expect_find_element()
        .times(1)
        .returning(move |_, id| Ok(Some(element(&tenant, id))));
    mocks
        .inputs
        .expect_add_input()
        .times(2)
        .withf(move |input| input.employee_id == employee)
        .returning(|_| Ok(()));

    let outcome = mocks
        .into_service()
        .import_inputs(&actor, Uuid::new_v4(), body)
        .await
        .expect("import succeeds");

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.skipped, 1);
}

#[rstest]
#[tokio::test]
async fn import_without_element_column_is_rejected(actor: ActorContext) {
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks.inputs.expect_add_input().times(0);

    let error = mocks
        .into_service()
        .import_inputs(&actor, Uuid::new_v4(), "employee_id,amount\n".to_owned())
        .await
        .expect_err("missing column");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn adjustment_requires_description(actor: ActorContext) {
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .employees
        .expect_employee_exists()
        .returning(|_, _| Ok(true));
    mocks.inputs.expect_add_adjustment().times(0);

    let error = mocks
        .into_service()
        .add_adjustment(
            &actor,
            Uuid::new_v4(),
            AdjustmentDraft {
                employee_id: Uuid::new_v4(),
                description: String::new(),
                amount: dec!(-20),
                effective_date: None,
            },
        )
        .await
        .expect_err("description required");

    assert_eq!(
        error.details(),
        Some(&json!({"field": "description", "code": "required"}))
    );
}

#[rstest]
#[tokio::test]
async fn deleting_unknown_adjustment_is_not_found(actor: ActorContext) {
    let mut mocks = Mocks::default().with_status(&actor, PeriodStatus::Draft);
    mocks
        .inputs
        .expect_delete_adjustment()
        .returning(|_, _, _| Ok(false));

    let error = mocks
        .into_service()
        .delete_adjustment(&actor, Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("unknown adjustment");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
