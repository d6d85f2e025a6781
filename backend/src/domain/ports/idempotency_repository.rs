//! Port abstraction for idempotency record persistence.
//!
//! A guarded call first claims its key with an in-progress record, then
//! either completes it with the serialized response or releases it so the
//! caller may retry. Expired records behave as if absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::idempotency::{
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency repository adapters.
    pub enum IdempotencyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "idempotency repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "idempotency repository query failed: {message}",
        /// Response serialization or deserialization failed.
        Serialization { message: String } => "idempotency repository serialization failed: {message}",
        /// A live record with this key already exists (concurrent claim race).
        DuplicateKey { message: String } => "idempotency key already exists: {message}",
    }
}

/// Port for idempotency record storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Look up the live record for `(tenant, user, key, endpoint)` and
    /// compare its request hash with the query's.
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
        now: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError>;

    /// Insert an in-progress record, overwriting an expired one.
    ///
    /// Fails with [`IdempotencyRepositoryError::DuplicateKey`] when a live
    /// record already exists.
    async fn claim(
        &self,
        record: &IdempotencyRecord,
        now: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError>;

    /// Attach the serialized response to a claimed record.
    async fn complete(
        &self,
        query: &IdempotencyLookupQuery,
        response: &serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError>;

    /// Drop a claimed record after the guarded operation failed.
    async fn release(&self, query: &IdempotencyLookupQuery)
    -> Result<(), IdempotencyRepositoryError>;

    /// Remove expired records, returning how many were deleted.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError>;
}

/// Repository that never remembers anything.
///
/// Every lookup misses, so guarded operations always execute.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdempotencyRepository;

#[async_trait]
impl IdempotencyRepository for FixtureIdempotencyRepository {
    async fn lookup(
        &self,
        _query: &IdempotencyLookupQuery,
        _now: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        Ok(IdempotencyLookupResult::NotFound)
    }

    async fn claim(
        &self,
        _record: &IdempotencyRecord,
        _now: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        Ok(())
    }

    async fn complete(
        &self,
        _query: &IdempotencyLookupQuery,
        _response: &serde_json::Value,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        Ok(())
    }

    async fn release(
        &self,
        _query: &IdempotencyLookupQuery,
    ) -> Result<(), IdempotencyRepositoryError> {
        Ok(())
    }

    async fn cleanup_expired(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<u64, IdempotencyRepositoryError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::idempotency::{IdempotencyKey, IdempotentEndpoint, canonicalize_and_hash};
    use crate::domain::{TenantId, UserId};

    #[tokio::test]
    async fn fixture_lookup_always_misses() {
        let query = IdempotencyLookupQuery {
            tenant_id: TenantId::random(),
            user_id: UserId::random(),
            key: IdempotencyKey::random(),
            endpoint: IdempotentEndpoint::PayrollFinalize,
            request_hash: canonicalize_and_hash(&json!({"periodId": "p"})).expect("hash"),
        };
        let repo = FixtureIdempotencyRepository;

        let result = repo.lookup(&query, Utc::now()).await.expect("lookup");

        assert_eq!(result, IdempotencyLookupResult::NotFound);
        assert_eq!(repo.cleanup_expired(Utc::now()).await.expect("cleanup"), 0);
    }

    #[test]
    fn duplicate_key_constructor_formats_message() {
        let err = IdempotencyRepositoryError::duplicate_key("payroll.finalize/abc");
        assert_eq!(
            err.to_string(),
            "idempotency key already exists: payroll.finalize/abc"
        );
    }
}
