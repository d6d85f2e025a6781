//! Caller-supplied idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest key accepted, in characters.
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key was empty or whitespace.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// The key exceeded [`IDEMPOTENCY_KEY_MAX_LEN`].
    #[error("idempotency key must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Opaque key sent by clients via the `Idempotency-Key` header.
///
/// Surrounding whitespace is trimmed; any other content is accepted verbatim.
///
/// # Example
///
/// ```
/// # use payroll::domain::idempotency::IdempotencyKey;
/// let key = IdempotencyKey::new("  finalize-2026-06  ").expect("valid key");
/// assert_eq!(key.as_ref(), "finalize-2026-06");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct a key.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        let trimmed = key.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if trimmed.chars().count() > IDEMPOTENCY_KEY_MAX_LEN {
            return Err(IdempotencyKeyValidationError::TooLong {
                max: IDEMPOTENCY_KEY_MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Generate a random key. Primarily useful for testing.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
