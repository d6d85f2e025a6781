//! Exactly-once execution of side-effecting operations keyed by caller keys.
//!
//! The first call claims `(tenant, user, key, endpoint)` with an in-progress
//! record, runs the operation and caches its serialized response. Retries with
//! the same request hash replay that response; retries with a different hash
//! are conflicts; retries racing an in-progress call poll briefly and then
//! give up with `service_unavailable`.
//!
//! Claims carry a short lease and only completion extends them to the full
//! TTL. A claim whose response could not be cached therefore stops blocking
//! its key once the lease lapses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::domain::idempotency::{
    IdempotencyConfig, IdempotencyKey, IdempotencyLookupQuery, IdempotencyLookupResult,
    IdempotencyRecord, IdempotentEndpoint, PayloadHash, canonicalize_and_hash,
};
use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};
use crate::domain::service_support::map_idempotency_error;
use crate::domain::{ActorContext, Error};

const IN_PROGRESS_MESSAGE: &str = "idempotent request is still in progress; retry shortly";
const CONFLICT_MESSAGE: &str = "idempotency key already used with a different request";
const DUPLICATE_RACE_MAX_RETRIES: usize = 20;
const DUPLICATE_RACE_RETRY_DELAY: Duration = Duration::from_millis(25);
const COMPLETE_ATTEMPTS: usize = 3;

/// Identifies one guarded call.
#[derive(Debug, Clone)]
pub struct GuardedRequest<'a> {
    /// Acting tenant and user.
    pub actor: &'a ActorContext,
    /// Caller key; `None` runs the operation unguarded.
    pub key: Option<IdempotencyKey>,
    /// Protected operation.
    pub endpoint: IdempotentEndpoint,
    /// Stable discriminator hashed to detect conflicting retries.
    pub discriminator: serde_json::Value,
}

/// Response of a guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guarded<T> {
    /// Response body.
    pub value: T,
    /// Whether the body came from the cache.
    pub replayed: bool,
}

/// Idempotency guard over an [`IdempotencyRepository`].
#[derive(Clone)]
pub struct IdempotencyGuard {
    repo: Arc<dyn IdempotencyRepository>,
    clock: Arc<dyn Clock>,
    config: IdempotencyConfig,
}

impl IdempotencyGuard {
    /// Create a guard.
    pub fn new(
        repo: Arc<dyn IdempotencyRepository>,
        clock: Arc<dyn Clock>,
        config: IdempotencyConfig,
    ) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    fn hash(discriminator: &serde_json::Value) -> Result<PayloadHash, Error> {
        canonicalize_and_hash(discriminator)
            .map_err(|err| Error::internal(format!("failed to hash idempotency request: {err}")))
    }

    fn replay<T: DeserializeOwned>(record: IdempotencyRecord) -> Result<Guarded<T>, Error> {
        let snapshot = record.cached_response.unwrap_or(serde_json::Value::Null);
        let value = serde_json::from_value(snapshot).map_err(|err| {
            Error::internal(format!("failed to deserialize cached response: {err}"))
        })?;
        Ok(Guarded {
            value,
            replayed: true,
        })
    }

    /// Run `operation` at most once per caller key.
    pub async fn run<T, F, Fut>(
        &self,
        request: GuardedRequest<'_>,
        operation: F,
    ) -> Result<Guarded<T>, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let Some(key) = request.key else {
            return operation().await.map(|value| Guarded {
                value,
                replayed: false,
            });
        };
        let query = IdempotencyLookupQuery {
            tenant_id: request.actor.tenant_id().clone(),
            user_id: request.actor.user_id().clone(),
            key,
            endpoint: request.endpoint,
            request_hash: Self::hash(&request.discriminator)?,
        };

        for attempt in 0..=DUPLICATE_RACE_MAX_RETRIES {
            let now = self.clock.utc();
            let lookup = self
                .repo
                .lookup(&query, now)
                .await
                .map_err(map_idempotency_error)?;
            match lookup {
                IdempotencyLookupResult::NotFound => match self.claim(&query).await {
                    Ok(()) => return self.execute(&query, operation).await,
                    Err(IdempotencyRepositoryError::DuplicateKey { message }) => {
                        debug!(key = %query.key, %message, "lost idempotency claim race");
                    }
                    Err(err) => return Err(map_idempotency_error(err)),
                },
                IdempotencyLookupResult::MatchingPayload(record) if record.is_in_progress() => {
                    debug!(key = %query.key, attempt, "idempotent request in progress");
                }
                IdempotencyLookupResult::MatchingPayload(record) => return Self::replay(record),
                IdempotencyLookupResult::ConflictingPayload(_) => {
                    return Err(Error::conflict(CONFLICT_MESSAGE));
                }
            }
            if attempt < DUPLICATE_RACE_MAX_RETRIES {
                tokio::time::sleep(DUPLICATE_RACE_RETRY_DELAY).await;
            }
        }
        Err(Error::service_unavailable(IN_PROGRESS_MESSAGE))
    }

    /// Delete records whose TTL has lapsed, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let purged = self
            .repo
            .cleanup_expired(self.clock.utc())
            .await
            .map_err(map_idempotency_error)?;
        debug!(purged, "purged expired idempotency records");
        Ok(purged)
    }

    async fn claim(&self, query: &IdempotencyLookupQuery) -> Result<(), IdempotencyRepositoryError> {
        let now = self.clock.utc();
        let record = IdempotencyRecord {
            tenant_id: query.tenant_id.clone(),
            user_id: query.user_id.clone(),
            key: query.key.clone(),
            endpoint: query.endpoint,
            request_hash: query.request_hash.clone(),
            cached_response: None,
            expires_at: now + self.config.claim_lease_chrono(),
        };
        self.repo.claim(&record, now).await
    }

    async fn cache(&self, query: &IdempotencyLookupQuery, snapshot: &serde_json::Value) {
        for attempt in 1..=COMPLETE_ATTEMPTS {
            let expires_at = self.clock.utc() + self.config.ttl_chrono();
            match self.repo.complete(query, snapshot, expires_at).await {
                Ok(()) => return,
                Err(err) if attempt < COMPLETE_ATTEMPTS => {
                    debug!(key = %query.key, attempt, error = %err, "retrying idempotent response cache");
                    tokio::time::sleep(DUPLICATE_RACE_RETRY_DELAY).await;
                }
                Err(err) => {
                    warn!(
                        key = %query.key,
                        error = %err,
                        lease_secs = self.config.claim_lease().as_secs(),
                        "failed to cache idempotent response; claim lapses with its lease"
                    );
                }
            }
        }
    }

    async fn execute<T, F, Fut>(
        &self,
        query: &IdempotencyLookupQuery,
        operation: F,
    ) -> Result<Guarded<T>, Error>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let value = match operation().await {
            Ok(value) => value,
            Err(err) => {
                if let Err(release_err) = self.repo.release(query).await {
                    warn!(key = %query.key, error = %release_err, "failed to release idempotency claim");
                }
                return Err(err);
            }
        };

        // Caching failures never fail a committed operation.
        match serde_json::to_value(&value) {
            Ok(snapshot) => self.cache(query, &snapshot).await,
            Err(err) => {
                warn!(key = %query.key, error = %err, "failed to serialize idempotent response");
            }
        }
        Ok(Guarded {
            value,
            replayed: false,
        })
    }
}

#[cfg(test)]
#[path = "idempotency_guard_tests.rs"]
mod tests;
