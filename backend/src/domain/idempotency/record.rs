//! Stored idempotency records and lookup types.

use chrono::{DateTime, Utc};

use super::{IdempotencyKey, IdempotentEndpoint, PayloadHash};
use crate::domain::{TenantId, UserId};

/// Stored record linking a key to its request hash and cached response.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    /// Tenant of the original caller.
    pub tenant_id: TenantId,
    /// User who made the original request.
    pub user_id: UserId,
    /// Key supplied by the caller.
    pub key: IdempotencyKey,
    /// Protected operation.
    pub endpoint: IdempotentEndpoint,
    /// SHA-256 of the canonical request discriminator.
    pub request_hash: PayloadHash,
    /// Serialized response; `None` while the first call is still running.
    pub cached_response: Option<serde_json::Value>,
    /// Instant after which the record counts as absent.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Whether the first call has not completed yet.
    pub fn is_in_progress(&self) -> bool {
        self.cached_response.is_none()
    }

    /// Whether the record has outlived its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of looking up an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub enum IdempotencyLookupResult {
    /// No live record exists for this key.
    NotFound,
    /// A record exists and the request hash matches.
    MatchingPayload(IdempotencyRecord),
    /// A record exists but the request hash differs.
    ConflictingPayload(IdempotencyRecord),
}

impl IdempotencyLookupResult {
    /// Classify a stored record against the incoming hash.
    pub fn classify(record: Option<IdempotencyRecord>, request_hash: &PayloadHash) -> Self {
        match record {
            None => Self::NotFound,
            Some(record) if &record.request_hash == request_hash => Self::MatchingPayload(record),
            Some(record) => Self::ConflictingPayload(record),
        }
    }
}

/// Parameters identifying one guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyLookupQuery {
    /// Acting tenant.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Caller key.
    pub key: IdempotencyKey,
    /// Protected operation.
    pub endpoint: IdempotentEndpoint,
    /// Hash of the incoming request.
    pub request_hash: PayloadHash,
}
