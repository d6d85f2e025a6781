//! Pay element catalog HTTP handlers.
//!
//! ```text
//! GET  /api/v1/payroll/elements
//! POST /api/v1/payroll/elements
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::payroll::{CalcType, ElementType, PayElement, PayElementDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::actor::Actor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_enum, parse_optional_decimal, require,
};

/// Request payload for defining an element.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementRequest {
    #[schema(example = "Overtime")]
    pub name: Option<String>,
    #[schema(value_type = ElementType)]
    pub element_type: Option<String>,
    #[schema(value_type = Option<CalcType>)]
    pub calc_type: Option<String>,
    #[schema(example = "0.00")]
    pub default_amount: Option<String>,
    pub taxable: Option<bool>,
}

/// Catalog element.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub element_type: ElementType,
    pub calc_type: CalcType,
    #[schema(example = "0.00")]
    pub default_amount: String,
    pub taxable: bool,
}

impl From<PayElement> for ElementResponse {
    fn from(element: PayElement) -> Self {
        Self {
            id: element.id.to_string(),
            name: element.name,
            element_type: element.element_type,
            calc_type: element.calc_type,
            default_amount: element.default_amount.to_string(),
            taxable: element.taxable,
        }
    }
}

fn parse_element_request(body: ElementRequest) -> Result<PayElementDraft, Error> {
    let element_type = FieldName::new("elementType");
    let calc_type = FieldName::new("calcType");
    Ok(PayElementDraft {
        name: require(body.name, FieldName::new("name"))?,
        element_type: parse_enum(&require(body.element_type, element_type)?, element_type)?,
        calc_type: body
            .calc_type
            .as_deref()
            .map(|raw| parse_enum(raw, calc_type))
            .transpose()?
            .unwrap_or(CalcType::Fixed),
        default_amount: parse_optional_decimal(
            body.default_amount.as_deref(),
            FieldName::new("defaultAmount"),
        )?
        .unwrap_or_default(),
        taxable: body.taxable.unwrap_or(true),
    })
}

/// List the tenant's pay elements.
#[utoipa::path(
    get,
    path = "/api/v1/payroll/elements",
    responses(
        (status = 200, description = "Pay element catalog", body = [ElementResponse]),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["elements"],
    operation_id = "listPayElements"
)]
#[get("/payroll/elements")]
pub async fn list_elements(
    state: web::Data<HttpState>,
    actor: Actor,
) -> ApiResult<web::Json<Vec<ElementResponse>>> {
    let elements = state.inputs.list_elements(actor.context()).await?;
    Ok(web::Json(
        elements.into_iter().map(ElementResponse::from).collect(),
    ))
}

/// Define a pay element.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/elements",
    request_body = ElementRequest,
    responses(
        (status = 201, description = "Pay element created", body = ElementResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["elements"],
    operation_id = "createPayElement"
)]
#[post("/payroll/elements")]
pub async fn create_element(
    state: web::Data<HttpState>,
    actor: Actor,
    payload: web::Json<ElementRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_element_request(payload.into_inner())?;
    let element = state.inputs.create_element(actor.context(), draft).await?;
    Ok(HttpResponse::Created().json(ElementResponse::from(element)))
}
