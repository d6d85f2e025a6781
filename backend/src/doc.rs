//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every payroll endpoint, the health probes, the
//! request and response bodies, and the gateway identity headers as
//! security schemes. The document backs Swagger UI in debug builds and is
//! printed by the `openapi_dump` binary for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::payroll::{CalcType, ElementType, InputSource, PeriodStatus, WarningCode};
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::actor::{TENANT_ID_HEADER, USER_ID_HEADER};
use crate::inbound::http::elements::{ElementRequest, ElementResponse};
use crate::inbound::http::payslips::{
    DownloadResponse, GenerateRequest, GenerateResponse, PayslipResponse,
};
use crate::inbound::http::periods::{
    AdjustmentBody, CreatePeriodBody, CreatedBody, ImportBody, InputBody, PeriodBody,
    PeriodStatusBody, ReopenBody, SummaryBody,
};

/// Register the gateway identity headers as API key schemes.
struct GatewayIdentityAddon;

impl Modify for GatewayIdentityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "TenantHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                TENANT_ID_HEADER,
                "Tenant identifier injected by the API gateway.",
            ))),
        );
        components.add_security_scheme(
            "UserHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                USER_ID_HEADER,
                "Acting user identifier injected by the API gateway.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&GatewayIdentityAddon),
    info(
        title = "Payroll backend API",
        description = "Pay period lifecycle, payroll inputs, exports and payslips."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TenantHeader" = [], "UserHeader" = [])),
    paths(
        crate::inbound::http::periods::create_period,
        crate::inbound::http::periods::get_period,
        crate::inbound::http::periods::run_period,
        crate::inbound::http::periods::finalize_period,
        crate::inbound::http::periods::reopen_period,
        crate::inbound::http::periods::add_input,
        crate::inbound::http::periods::import_inputs,
        crate::inbound::http::periods::add_adjustment,
        crate::inbound::http::periods::delete_adjustment,
        crate::inbound::http::periods::export_register,
        crate::inbound::http::periods::export_journal,
        crate::inbound::http::periods::summary,
        crate::inbound::http::elements::list_elements,
        crate::inbound::http::elements::create_element,
        crate::inbound::http::payslips::list_payslips,
        crate::inbound::http::payslips::generate_payslips,
        crate::inbound::http::payslips::download_payslip,
        crate::inbound::http::payslips::regenerate_payslip,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        PeriodStatus,
        ElementType,
        CalcType,
        InputSource,
        WarningCode,
        CreatePeriodBody,
        CreatedBody,
        PeriodBody,
        PeriodStatusBody,
        ReopenBody,
        InputBody,
        ImportBody,
        AdjustmentBody,
        SummaryBody,
        ElementRequest,
        ElementResponse,
        PayslipResponse,
        GenerateRequest,
        GenerateResponse,
        DownloadResponse,
    )),
    tags(
        (name = "periods", description = "Pay period lifecycle"),
        (name = "inputs", description = "Payroll inputs and adjustments"),
        (name = "elements", description = "Pay element catalog"),
        (name = "exports", description = "Register, journal and summary"),
        (name = "payslips", description = "Payslip documents"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", &["code", "message", "traceId", "details"])]
    #[case("PeriodBody", &["id", "scheduleId", "startDate", "endDate", "status"])]
    #[case("SummaryBody", &["totalGross", "totalDeductions", "totalNet", "warnings"])]
    fn schemas_use_camel_case_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");

        let present = object_fields(schema);
        for field in fields {
            assert!(
                present.iter().any(|candidate| candidate == field),
                "{name} should expose {field}"
            );
        }
    }

    #[rstest]
    #[case("/api/v1/payroll/periods/{period_id}/finalize")]
    #[case("/api/v1/payroll/periods/{period_id}/inputs/import")]
    #[case("/api/v1/payroll/payslips/{payslip_id}/download")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn gateway_headers_are_security_schemes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("TenantHeader"));
        assert!(components.security_schemes.contains_key("UserHeader"));
    }
}
