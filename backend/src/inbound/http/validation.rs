//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDate,
    InvalidAmount,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_optional_uuid(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Uuid>, Error> {
    value.map(|raw| parse_uuid(raw, field)).transpose()
}

/// Parse an ISO calendar date, e.g. `2026-06-30`.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a date formatted YYYY-MM-DD"))
            .with_value(ErrorCode::InvalidDate, value)
    })
}

pub(crate) fn parse_optional_date(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<NaiveDate>, Error> {
    value.map(|raw| parse_date(raw, field)).transpose()
}

/// Parse a money or quantity value sent as a JSON string, e.g. `"1250.00"`.
pub(crate) fn parse_decimal(value: &str, field: FieldName) -> Result<Decimal, Error> {
    Decimal::from_str(value.trim()).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a decimal number"))
            .with_value(ErrorCode::InvalidAmount, value)
    })
}

pub(crate) fn parse_optional_decimal(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Decimal>, Error> {
    value.map(|raw| parse_decimal(raw, field)).transpose()
}

/// Parse a closed enum sent as a string, e.g. `"earning"`.
pub(crate) fn parse_enum<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(value).map_err(|err| {
        ValidationError::new(field.as_str(), err.to_string())
            .with_value(ErrorCode::InvalidValue, value)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case("1250.00", dec!(1250.00))]
    #[case(" -12.5 ", dec!(-12.5))]
    fn decimals_parse_from_strings(#[case] raw: &str, #[case] expected: Decimal) {
        assert_eq!(
            parse_decimal(raw, FieldName::new("amount")).expect("valid decimal"),
            expected
        );
    }

    #[rstest]
    fn malformed_decimal_reports_field_and_value() {
        let err = parse_decimal("12,50", FieldName::new("rate")).expect_err("rejected");

        assert_eq!(
            err.details(),
            Some(&json!({"field": "rate", "value": "12,50", "code": "invalid_amount"}))
        );
    }

    #[rstest]
    fn invalid_uuid_reports_field_and_value() {
        let err = parse_uuid("emp-1", FieldName::new("employeeId")).expect_err("rejected");

        assert_eq!(err.message(), "employeeId must be a valid UUID");
        assert_eq!(
            err.details(),
            Some(&json!({"field": "employeeId", "value": "emp-1", "code": "invalid_uuid"}))
        );
    }

    #[rstest]
    #[case("2026-06-31")]
    #[case("30/06/2026")]
    fn invalid_dates_are_rejected(#[case] raw: &str) {
        let err = parse_date(raw, FieldName::new("endDate")).expect_err("rejected");

        assert_eq!(
            err.details().and_then(|details| details.get("code")),
            Some(&json!("invalid_date"))
        );
    }

    #[rstest]
    fn missing_field_names_the_field() {
        let err = require::<Decimal>(None, FieldName::new("amount")).expect_err("missing");

        assert_eq!(err.message(), "missing required field: amount");
    }
}
