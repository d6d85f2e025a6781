//! PostgreSQL-backed `IdempotencyRepository` implementation using Diesel ORM.
//!
//! Records are keyed by tenant, user, caller key and endpoint. Lookups ignore
//! rows whose `expires_at` has passed, and a claim may take over an expired
//! row in place. A live row makes the claim fail with `DuplicateKey`, which
//! the guard resolves by looking the record up again.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;

use crate::domain::idempotency::{
    IdempotencyKey, IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
    IdempotentEndpoint, PayloadHash,
};
use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};
use crate::domain::{TenantId, UserId};

use super::diesel_error_mapping::{map_diesel_failure, map_pool_failure};
use super::models::{IdempotencyKeyRow, NewIdempotencyKeyRow};
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_keys;

/// Diesel-backed implementation of the `IdempotencyRepository` port.
#[derive(Clone)]
pub struct DieselIdempotencyRepository {
    pool: DbPool,
}

impl DieselIdempotencyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdempotencyRepositoryError {
    map_pool_failure(error)
}

/// Unique violations surface as `DuplicateKey` so a lost claim race is
/// distinguishable from other failures.
fn map_diesel_error(error: diesel::result::Error) -> IdempotencyRepositoryError {
    map_diesel_failure(error, "idempotency_keys")
}

fn row_to_record(row: IdempotencyKeyRow) -> Result<IdempotencyRecord, IdempotencyRepositoryError> {
    let key = IdempotencyKey::new(&row.key).map_err(|err| {
        IdempotencyRepositoryError::serialization(format!("invalid key in database: {err}"))
    })?;
    let endpoint = IdempotentEndpoint::from_str(&row.endpoint)
        .map_err(|err| IdempotencyRepositoryError::serialization(err.to_string()))?;
    let request_hash = PayloadHash::try_from_bytes(&row.request_hash).map_err(|err| {
        IdempotencyRepositoryError::serialization(format!("corrupted request hash: {err}"))
    })?;

    Ok(IdempotencyRecord {
        tenant_id: TenantId::from_uuid(row.tenant_id),
        user_id: UserId::from_uuid(row.user_id),
        key,
        endpoint,
        request_hash,
        cached_response: row.cached_response,
        expires_at: row.expires_at,
    })
}

/// Primary-key filter for one record.
macro_rules! record_filter {
    ($query:expr) => {
        idempotency_keys::tenant_id
            .eq(*$query.tenant_id.as_uuid())
            .and(idempotency_keys::user_id.eq(*$query.user_id.as_uuid()))
            .and(idempotency_keys::key.eq($query.key.as_ref()))
            .and(idempotency_keys::endpoint.eq($query.endpoint.as_str()))
    };
}

#[async_trait]
impl IdempotencyRepository for DieselIdempotencyRepository {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
        now: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IdempotencyKeyRow> = idempotency_keys::table
            .filter(record_filter!(query))
            .filter(idempotency_keys::expires_at.gt(now))
            .select(IdempotencyKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let record = row.map(row_to_record).transpose()?;
        Ok(IdempotencyLookupResult::classify(record, &query.request_hash))
    }

    async fn claim(
        &self,
        record: &IdempotencyRecord,
        now: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewIdempotencyKeyRow {
            tenant_id: *record.tenant_id.as_uuid(),
            user_id: *record.user_id.as_uuid(),
            key: record.key.as_ref(),
            endpoint: record.endpoint.as_str(),
            request_hash: record.request_hash.as_bytes(),
            cached_response: record.cached_response.as_ref(),
            expires_at: record.expires_at,
        };

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let evicted = diesel::delete(idempotency_keys::table)
                    .filter(record_filter!(record))
                    .filter(idempotency_keys::expires_at.le(now))
                    .execute(conn)
                    .await?;
                if evicted > 0 {
                    debug!(key = %record.key, "replacing expired idempotency record");
                }
                diesel::insert_into(idempotency_keys::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn complete(
        &self,
        query: &IdempotencyLookupQuery,
        response: &serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(idempotency_keys::table)
            .filter(record_filter!(query))
            .set((
                idempotency_keys::cached_response.eq(Some(response)),
                idempotency_keys::expires_at.eq(expires_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(IdempotencyRepositoryError::query(format!(
                "no claim to complete for key {}",
                query.key
            )));
        }
        Ok(())
    }

    async fn release(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<(), IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(idempotency_keys::table)
            .filter(record_filter!(query))
            .filter(idempotency_keys::cached_response.is_null())
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(idempotency_keys::table)
            .filter(idempotency_keys::expires_at.le(now))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(deleted, cutoff = %now, "cleaned up expired idempotency records");
        u64::try_from(deleted).map_err(|err| IdempotencyRepositoryError::query(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    fn row() -> IdempotencyKeyRow {
        IdempotencyKeyRow {
            tenant_id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            key: "finalize-june".to_owned(),
            endpoint: "payroll.finalize".to_owned(),
            request_hash: vec![7; 32],
            cached_response: None,
            expires_at: Utc::now(),
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            IdempotencyRepositoryError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_key() {
        let repo_err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        ));

        assert!(
            matches!(repo_err, IdempotencyRepositoryError::DuplicateKey { .. }),
            "expected DuplicateKey error, got {repo_err:?}"
        );
    }

    #[rstest]
    fn row_converts_to_in_progress_record() {
        let record = row_to_record(row()).expect("valid row");

        assert!(record.is_in_progress());
        assert_eq!(record.endpoint, IdempotentEndpoint::PayrollFinalize);
        assert_eq!(record.key.as_ref(), "finalize-june");
    }

    #[rstest]
    #[case::short_hash(IdempotencyKeyRow { request_hash: vec![1; 4], ..row() })]
    #[case::unknown_endpoint(IdempotencyKeyRow { endpoint: "payroll.run".to_owned(), ..row() })]
    fn corrupted_rows_are_serialization_errors(#[case] row: IdempotencyKeyRow) {
        let err = row_to_record(row).expect_err("corrupted row");

        assert!(matches!(
            err,
            IdempotencyRepositoryError::Serialization { .. }
        ));
    }
}
