//! HTTP flow through the real services wired to in-memory adapters.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use payroll::Trace;
use payroll::inbound::http::elements::{create_element, list_elements};
use payroll::inbound::http::error::json_config;
use payroll::inbound::http::payslips::{download_payslip, generate_payslips, list_payslips};
use payroll::inbound::http::periods::{
    add_input, create_period, export_register, finalize_period, get_period, reopen_period,
    run_period, summary,
};
use payroll::test_support::PayrollHarness;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

mod support;

use support::{TENANT_ID, USER_ID, now, profile, seed_employee};

macro_rules! init_app {
    ($harness:expr) => {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new($harness.http_state()))
                .wrap(Trace)
                .service(
                    web::scope("/api/v1")
                        .app_data(json_config())
                        .service(create_period)
                        .service(get_period)
                        .service(run_period)
                        .service(finalize_period)
                        .service(reopen_period)
                        .service(add_input)
                        .service(export_register)
                        .service(summary)
                        .service(create_element)
                        .service(list_elements)
                        .service(list_payslips)
                        .service(generate_payslips)
                        .service(download_payslip),
                ),
        )
        .await
    };
}

fn post(uri: &str) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri(uri)
        .insert_header(("X-Tenant-Id", TENANT_ID))
        .insert_header(("X-User-Id", USER_ID))
}

fn get(uri: &str) -> actix_test::TestRequest {
    actix_test::TestRequest::get()
        .uri(uri)
        .insert_header(("X-Tenant-Id", TENANT_ID))
        .insert_header(("X-User-Id", USER_ID))
}

#[actix_web::test]
async fn period_moves_from_draft_to_finalized_over_http() {
    let harness = PayrollHarness::new(now());
    let employee_id = seed_employee(
        &harness,
        profile("grace@example.com", Some(dec!(1000)), true),
    );
    let app = init_app!(harness);

    let created: Value = actix_test::call_and_read_body_json(
        &app,
        post("/api/v1/payroll/periods")
            .set_json(json!({
                "scheduleId": "00000000-0000-0000-0000-0000000000c1",
                "startDate": "2026-06-01",
                "endDate": "2026-06-30"
            }))
            .to_request(),
    )
    .await;
    let period_id = created["id"].as_str().expect("period id").to_owned();

    let element: Value = actix_test::call_and_read_body_json(
        &app,
        post("/api/v1/payroll/elements")
            .set_json(json!({
                "name": "Overtime",
                "elementType": "earning",
                "calcType": "fixed",
                "defaultAmount": "0",
                "taxable": true
            }))
            .to_request(),
    )
    .await;
    let element_id = element["id"].as_str().expect("element id").to_owned();

    let response = actix_test::call_service(
        &app,
        post(&format!("/api/v1/payroll/periods/{period_id}/inputs"))
            .set_json(json!({
                "employeeId": employee_id.to_string(),
                "elementId": element_id,
                "amount": "250.50"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let run: Value = actix_test::call_and_read_body_json(
        &app,
        post(&format!("/api/v1/payroll/periods/{period_id}/run")).to_request(),
    )
    .await;
    assert_eq!(run["status"], "reviewed");

    let totals: Value = actix_test::call_and_read_body_json(
        &app,
        get(&format!("/api/v1/payroll/periods/{period_id}/summary")).to_request(),
    )
    .await;
    assert_eq!(totals["totalNet"], "1250.50");
    assert_eq!(totals["employeeCount"], 1);

    let finalize = |key: &'static str| {
        post(&format!("/api/v1/payroll/periods/{period_id}/finalize"))
            .insert_header(("Idempotency-Key", key))
            .to_request()
    };
    let first = actix_test::call_service(&app, finalize("june-close")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(first.headers().get("Idempotent-Replayed").is_none());
    let replay = actix_test::call_service(&app, finalize("june-close")).await;
    assert_eq!(
        replay
            .headers()
            .get("Idempotent-Replayed")
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    let body: Value = actix_test::read_body_json(replay).await;
    assert_eq!(body["status"], "finalized");

    let payslips: Value = actix_test::call_and_read_body_json(
        &app,
        get(&format!("/api/v1/payroll/payslips?periodId={period_id}")).to_request(),
    )
    .await;
    let payslips = payslips.as_array().expect("payslip list");
    assert_eq!(payslips.len(), 1);
    assert_eq!(harness.events.notifications().len(), 1);

    let payslip_id = payslips[0]["id"].as_str().expect("payslip id");
    let download: Value = actix_test::call_and_read_body_json(
        &app,
        get(&format!("/api/v1/payroll/payslips/{payslip_id}/download")).to_request(),
    )
    .await;
    assert!(
        download["fileRef"]
            .as_str()
            .is_some_and(|file_ref| file_ref.starts_with("payslips/"))
    );

    let register = actix_test::call_service(
        &app,
        get(&format!("/api/v1/payroll/periods/{period_id}/export/register")).to_request(),
    )
    .await;
    assert_eq!(register.status(), StatusCode::OK);
    let csv = actix_test::read_body(register).await;
    let csv = std::str::from_utf8(&csv).expect("utf8 csv");
    let line = csv
        .lines()
        .find(|line| line.starts_with(&employee_id.to_string()))
        .expect("register line for the employee");
    assert!(line.contains(",Grace,Hopper,1250.50,"), "{line}");
    assert!(line.ends_with(",1250.50,USD"), "{line}");
}

#[actix_web::test]
async fn running_a_finalized_period_is_rejected() {
    let harness = PayrollHarness::new(now());
    seed_employee(&harness, profile("ada@example.com", Some(dec!(800)), true));
    let app = init_app!(harness);

    let created: Value = actix_test::call_and_read_body_json(
        &app,
        post("/api/v1/payroll/periods")
            .set_json(json!({
                "scheduleId": "00000000-0000-0000-0000-0000000000c2",
                "startDate": "2026-06-01",
                "endDate": "2026-06-30"
            }))
            .to_request(),
    )
    .await;
    let period_id = created["id"].as_str().expect("period id").to_owned();
    for action in ["run", "finalize"] {
        let response = actix_test::call_service(
            &app,
            post(&format!("/api/v1/payroll/periods/{period_id}/{action}")).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{action}");
    }

    let response = actix_test::call_service(
        &app,
        post(&format!("/api/v1/payroll/periods/{period_id}/run")).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_state_transition");
    assert!(body["traceId"].is_string());

    let reopen = actix_test::call_service(
        &app,
        post(&format!("/api/v1/payroll/periods/{period_id}/reopen"))
            .set_json(json!({ "reason": "bank file rejected" }))
            .to_request(),
    )
    .await;
    assert_eq!(reopen.status(), StatusCode::OK);
    let period: Value = actix_test::call_and_read_body_json(
        &app,
        get(&format!("/api/v1/payroll/periods/{period_id}")).to_request(),
    )
    .await;
    assert_eq!(period["status"], "draft");
}
