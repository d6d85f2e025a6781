//! Idempotency primitives for safe finalize retries.
//!
//! - [`IdempotencyKey`]: opaque caller key from the `Idempotency-Key` header.
//! - [`PayloadHash`]: SHA-256 of the canonical request discriminator.
//! - [`IdempotencyRecord`]: stored claim or cached response.
//! - [`IdempotentEndpoint`]: operation the key is scoped to.
//! - [`IdempotencyConfig`]: record TTL.

mod config;
mod endpoint;
mod key;
mod payload;
mod record;

pub use config::{
    DefaultIdempotencyEnv, IDEMPOTENCY_TTL_HOURS_ENV, IdempotencyConfig, IdempotencyEnv,
};
pub use endpoint::{IdempotentEndpoint, ParseIdempotentEndpointError};
pub use key::{IDEMPOTENCY_KEY_MAX_LEN, IdempotencyKey, IdempotencyKeyValidationError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash};
pub use record::{IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord};
