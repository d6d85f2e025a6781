//! Helpers for parsing idempotency headers in HTTP handlers.

use actix_web::http::header::HeaderMap;
use serde_json::json;

use crate::domain::Error;
use crate::domain::idempotency::{IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Response header set when a finalize body was replayed from the key store.
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "Idempotent-Replayed";

/// Extract the idempotency key from request headers.
///
/// A missing header is not an error; the operation then runs unguarded.
pub fn extract_idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, Error> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let raw = header_value.to_str().map_err(|_| {
        Error::invalid_request("idempotency-key header must be visible ASCII")
            .with_details(json!({ "header": IDEMPOTENCY_KEY_HEADER }))
    })?;

    IdempotencyKey::new(raw)
        .map(Some)
        .map_err(map_idempotency_key_error)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    let message = match err {
        IdempotencyKeyValidationError::EmptyKey => {
            "idempotency-key header must not be empty".to_owned()
        }
        IdempotencyKeyValidationError::TooLong { max } => {
            format!("idempotency-key header must be at most {max} characters")
        }
    };
    Error::invalid_request(message).with_details(json!({ "header": IDEMPOTENCY_KEY_HEADER }))
}
