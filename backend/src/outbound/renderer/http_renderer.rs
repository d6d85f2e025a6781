//! Reqwest-backed payslip renderer adapter.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and decoding of the returned file reference.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{RenderRequestDto, RenderResponseDto};
use crate::domain::payroll::PayslipRenderPayload;
use crate::domain::ports::{PayslipRenderer, PayslipRendererError};

const DEFAULT_USER_AGENT: &str = "payroll-backend-renderer/0.1";

/// Renderer adapter that POSTs payloads to `<base>/render`.
pub struct HttpPayslipRenderer {
    client: Client,
    endpoint: Url,
}

impl HttpPayslipRenderer {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` cannot be joined with `render` or the
    /// reqwest client cannot be constructed.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, RendererBuildError> {
        let endpoint = endpoint_for(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

/// Failure constructing [`HttpPayslipRenderer`].
#[derive(Debug, thiserror::Error)]
pub enum RendererBuildError {
    /// The base URL cannot carry a path.
    #[error("invalid renderer url: {0}")]
    Url(#[from] url::ParseError),
    /// TLS or client configuration failed.
    #[error("failed to build renderer client: {0}")]
    Client(#[from] reqwest::Error),
}

fn endpoint_for(base_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("render")
}

#[async_trait]
impl PayslipRenderer for HttpPayslipRenderer {
    async fn render(&self, payload: &PayslipRenderPayload) -> Result<String, PayslipRendererError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&RenderRequestDto::from(payload))
            .send()
            .await
            .map_err(|error| PayslipRendererError::unavailable(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| PayslipRendererError::unavailable(error.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_file_ref(body.as_ref())
    }
}

fn parse_file_ref(body: &[u8]) -> Result<String, PayslipRendererError> {
    let decoded: RenderResponseDto = serde_json::from_slice(body).map_err(|error| {
        PayslipRendererError::rejected(format!("invalid renderer response: {error}"))
    })?;
    if decoded.file_ref.trim().is_empty() {
        return Err(PayslipRendererError::rejected(
            "renderer returned an empty file reference",
        ));
    }
    Ok(decoded.file_ref)
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PayslipRendererError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        PayslipRendererError::rejected(message)
    } else {
        PayslipRendererError::unavailable(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network mapping helpers.

    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[rstest]
    #[case("http://renderer:8080", "http://renderer:8080/render")]
    #[case("http://renderer:8080/docs", "http://renderer:8080/docs/render")]
    #[case("http://renderer:8080/docs/", "http://renderer:8080/docs/render")]
    fn render_endpoint_appends_to_base_path(#[case] base: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("valid url");

        assert_eq!(endpoint_for(&base).expect("joined").as_str(), expected);
    }

    #[rstest]
    #[case::bad_request(StatusCode::BAD_REQUEST, true)]
    #[case::unprocessable(StatusCode::UNPROCESSABLE_ENTITY, true)]
    #[case::throttled(StatusCode::TOO_MANY_REQUESTS, false)]
    #[case::server_error(StatusCode::BAD_GATEWAY, false)]
    fn statuses_split_into_rejected_and_unavailable(
        #[case] status: StatusCode,
        #[case] rejected: bool,
    ) {
        let error = map_status_error(status, b"{\"error\":\"template missing\"}");

        assert_eq!(
            matches!(error, PayslipRendererError::Rejected { .. }),
            rejected,
            "unexpected mapping for {status}: {error:?}"
        );
    }

    #[rstest]
    fn file_ref_is_decoded() {
        let file_ref = parse_file_ref(br#"{"fileRef":"s3://payslips/a.pdf"}"#).expect("decoded");

        assert_eq!(file_ref, "s3://payslips/a.pdf");
    }

    #[rstest]
    #[case(br#"{"fileRef":"  "}"#.as_slice())]
    #[case(b"<html>oops</html>".as_slice())]
    fn unusable_bodies_are_rejected(#[case] body: &[u8]) {
        assert!(matches!(
            parse_file_ref(body),
            Err(PayslipRendererError::Rejected { .. })
        ));
    }

    #[rstest]
    fn request_body_uses_camel_case_and_string_amounts() {
        let payload = PayslipRenderPayload {
            payslip_id: Uuid::nil(),
            employee_id: Uuid::nil(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            period_start: NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date"),
            period_end: NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date"),
            gross: dec!(1200.00),
            deductions: dec!(100.00),
            net: dec!(1100.00),
            currency: "USD".to_owned(),
        };

        let body = serde_json::to_value(RenderRequestDto::from(&payload)).expect("serialises");

        assert_eq!(body["employeeName"], "Ada Lovelace");
        assert_eq!(body["net"], "1100.00");
        assert_eq!(body["periodStart"], "2026-06-01");
    }
}
