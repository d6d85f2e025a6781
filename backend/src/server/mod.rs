//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, ServerSettings};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use payroll::Trace;
#[cfg(debug_assertions)]
use payroll::doc::ApiDoc;
use payroll::inbound::http::elements::{create_element, list_elements};
use payroll::inbound::http::error::json_config;
use payroll::inbound::http::health::{HealthState, live, ready};
use payroll::inbound::http::payslips::{
    download_payslip, generate_payslips, list_payslips, regenerate_payslip,
};
use payroll::inbound::http::periods::{
    add_adjustment, add_input, create_period, delete_adjustment, export_journal, export_register,
    finalize_period, get_period, import_inputs, reopen_period, run_period, summary,
};
use payroll::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let api = web::scope("/api/v1")
        .app_data(json_config())
        .service(create_period)
        .service(get_period)
        .service(run_period)
        .service(finalize_period)
        .service(reopen_period)
        .service(add_input)
        .service(import_inputs)
        .service(add_adjustment)
        .service(delete_adjustment)
        .service(export_register)
        .service(export_journal)
        .service(summary)
        .service(list_elements)
        .service(create_element)
        .service(list_payslips)
        .service(generate_payslips)
        .service(download_payslip)
        .service(regenerate_payslip);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] carrying the bind address, optional
///   database pool and payslip renderer.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);
    let bind_addr = config.bind_addr;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
