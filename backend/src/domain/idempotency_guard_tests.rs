//! Idempotency guard orchestration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local, TimeZone, Utc};
use mockall::predicate::always;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::idempotency::IdempotencyLookupQuery;
use crate::domain::ports::MockIdempotencyRepository;
use crate::test_support::{InMemoryPayrollStore, MutableClock};
use crate::domain::{ErrorCode, TenantId, UserId};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn guard(repo: MockIdempotencyRepository) -> IdempotencyGuard {
    IdempotencyGuard::new(
        Arc::new(repo),
        Arc::new(FixtureClock(now())),
        IdempotencyConfig::default(),
    )
}

#[fixture]
fn actor() -> ActorContext {
    ActorContext::new(TenantId::random(), UserId::random())
}

fn request(actor: &ActorContext, key: Option<IdempotencyKey>) -> GuardedRequest<'_> {
    GuardedRequest {
        actor,
        key,
        endpoint: IdempotentEndpoint::PayrollFinalize,
        discriminator: json!({"periodId": "6f1c1f7e-1d0a-4a55-9a7e-2f4d8c1e9b10"}),
    }
}

fn stored(actor: &ActorContext, hash: PayloadHash, cached: Option<Value>) -> IdempotencyRecord {
    IdempotencyRecord {
        tenant_id: actor.tenant_id().clone(),
        user_id: actor.user_id().clone(),
        key: IdempotencyKey::new("retry-1").expect("valid key"),
        endpoint: IdempotentEndpoint::PayrollFinalize,
        request_hash: hash,
        cached_response: cached,
        expires_at: now() + chrono::Duration::hours(24),
    }
}

fn counting_operation(
    calls: &Arc<AtomicUsize>,
) -> impl FnOnce() -> std::future::Ready<Result<Value, Error>> {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(json!({"status": "finalized"})))
    }
}

#[rstest]
#[tokio::test]
async fn missing_key_runs_unguarded(actor: ActorContext) {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup().times(0);
    repo.expect_claim().times(0);
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(request(&actor, None), counting_operation(&calls))
        .await
        .expect("operation succeeds");

    assert!(!outcome.replayed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn first_call_claims_runs_and_caches(actor: ActorContext) {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .times(1)
        .returning(|_, _| Ok(IdempotencyLookupResult::NotFound));
    repo.expect_claim()
        .times(1)
        .withf(|record, at| {
            record.is_in_progress()
                && *at == now()
                && record.expires_at == now() + chrono::Duration::minutes(5)
        })
        .returning(|_, _| Ok(()));
    repo.expect_complete()
        .times(1)
        .withf(|_, response, expires_at| {
            response == &json!({"status": "finalized"})
                && *expires_at == now() + chrono::Duration::hours(24)
        })
        .returning(|_, _, _| Ok(()));
    repo.expect_release().times(0);
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect("operation succeeds");

    assert_eq!(outcome.value, json!({"status": "finalized"}));
    assert!(!outcome.replayed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn matching_retry_replays_without_running(actor: ActorContext) {
    let hash = IdempotencyGuard::hash(&request(&actor, None).discriminator).expect("hash");
    let record = stored(&actor, hash, Some(json!({"status": "finalized"})));
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .times(1)
        .return_once(move |_, _| Ok(IdempotencyLookupResult::MatchingPayload(record)));
    repo.expect_claim().times(0);
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect("replay succeeds");

    assert!(outcome.replayed);
    assert_eq!(outcome.value, json!({"status": "finalized"}));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn conflicting_retry_is_rejected(actor: ActorContext) {
    let record = stored(&actor, PayloadHash::from_bytes([9; 32]), Some(json!({})));
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .return_once(move |_, _| Ok(IdempotencyLookupResult::ConflictingPayload(record)));
    let calls = Arc::new(AtomicUsize::new(0));

    let error = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn failed_operation_releases_the_claim(actor: ActorContext) {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .returning(|_, _| Ok(IdempotencyLookupResult::NotFound));
    repo.expect_claim().returning(|_, _| Ok(()));
    repo.expect_release()
        .times(1)
        .with(always())
        .returning(|_| Ok(()));
    repo.expect_complete().times(0);

    let error = guard(repo)
        .run(request(&actor, IdempotencyKey::new("retry-1").ok()), || async {
            Err::<Value, _>(Error::invalid_state_transition("cannot finalize a draft pay period"))
        })
        .await
        .expect_err("operation fails");

    assert_eq!(error.code(), ErrorCode::InvalidStateTransition);
}

#[rstest]
#[tokio::test]
async fn lost_claim_race_replays_the_winner(actor: ActorContext) {
    let hash = IdempotencyGuard::hash(&request(&actor, None).discriminator).expect("hash");
    let winner = stored(&actor, hash, Some(json!({"status": "finalized"})));
    let lookups = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&lookups);
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup().times(2).returning(move |_, _| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(IdempotencyLookupResult::NotFound)
        } else {
            Ok(IdempotencyLookupResult::MatchingPayload(winner.clone()))
        }
    });
    repo.expect_claim()
        .times(1)
        .returning(|_, _| Err(IdempotencyRepositoryError::duplicate_key("race")));
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect("replay after race");

    assert!(outcome.replayed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn stuck_in_progress_gives_up_as_unavailable(actor: ActorContext) {
    let hash = IdempotencyGuard::hash(&request(&actor, None).discriminator).expect("hash");
    let pending = stored(&actor, hash, None);
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .times(DUPLICATE_RACE_MAX_RETRIES + 1)
        .returning(move |_, _| Ok(IdempotencyLookupResult::MatchingPayload(pending.clone())));
    let calls = Arc::new(AtomicUsize::new(0));

    let error = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect_err("still in progress");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn caching_failure_still_returns_the_committed_response(actor: ActorContext) {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .returning(|_, _| Ok(IdempotencyLookupResult::NotFound));
    repo.expect_claim().returning(|_, _| Ok(()));
    repo.expect_complete()
        .returning(|_, _, _| Err(IdempotencyRepositoryError::connection("gone")));
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect("committed response is returned");

    assert!(!outcome.replayed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn purge_uses_the_clock_and_reports_the_count() {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_cleanup_expired()
        .withf(|at| *at == now())
        .times(1)
        .returning(|_| Ok(3));

    let purged = guard(repo).purge_expired().await.expect("purge succeeds");
    assert_eq!(purged, 3);
}

#[tokio::test]
async fn purge_surfaces_connection_failures() {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_cleanup_expired()
        .returning(|_| Err(IdempotencyRepositoryError::connection("refused")));

    let err = guard(repo).purge_expired().await.expect_err("purge fails");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn transient_caching_failure_is_retried(actor: ActorContext) {
    let mut repo = MockIdempotencyRepository::new();
    repo.expect_lookup()
        .returning(|_, _| Ok(IdempotencyLookupResult::NotFound));
    repo.expect_claim().returning(|_, _| Ok(()));
    let failures = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&failures);
    repo.expect_complete().times(2).returning(move |_, _, _| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(IdempotencyRepositoryError::connection("reset"))
        } else {
            Ok(())
        }
    });
    repo.expect_release().times(0);
    let calls = Arc::new(AtomicUsize::new(0));

    let outcome = guard(repo)
        .run(
            request(&actor, IdempotencyKey::new("retry-1").ok()),
            counting_operation(&calls),
        )
        .await
        .expect("committed response is returned");

    assert!(!outcome.replayed);
    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

/// Store whose response cache is permanently broken.
struct UncachedStore(InMemoryPayrollStore);

#[async_trait::async_trait]
impl IdempotencyRepository for UncachedStore {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
        now: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        self.0.lookup(query, now).await
    }

    async fn claim(
        &self,
        record: &IdempotencyRecord,
        now: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        self.0.claim(record, now).await
    }

    async fn complete(
        &self,
        _query: &IdempotencyLookupQuery,
        _response: &Value,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), IdempotencyRepositoryError> {
        Err(IdempotencyRepositoryError::query("cache table unavailable"))
    }

    async fn release(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<(), IdempotencyRepositoryError> {
        self.0.release(query).await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, IdempotencyRepositoryError> {
        self.0.cleanup_expired(now).await
    }
}

#[rstest]
#[tokio::test]
async fn uncached_claim_stops_blocking_the_key_after_its_lease(actor: ActorContext) {
    let clock = Arc::new(MutableClock::new(now()));
    let guard = IdempotencyGuard::new(
        Arc::new(UncachedStore(InMemoryPayrollStore::new())),
        clock.clone(),
        IdempotencyConfig::default(),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let key = || IdempotencyKey::new("retry-1").ok();

    let first = guard
        .run(request(&actor, key()), counting_operation(&calls))
        .await
        .expect("committed response is returned");
    assert_eq!(first.value, json!({"status": "finalized"}));

    let blocked = guard
        .run(request(&actor, key()), counting_operation(&calls))
        .await
        .expect_err("claim still leased");
    assert_eq!(blocked.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(IdempotencyConfig::default().claim_lease() + std::time::Duration::from_secs(1));
    let retried = guard
        .run(request(&actor, key()), counting_operation(&calls))
        .await
        .expect("lapsed claim is taken over");
    assert!(!retried.replayed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
