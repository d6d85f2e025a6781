//! Environment-driven idempotency TTL.

use std::time::Duration;

/// Environment variable holding the TTL in hours.
pub const IDEMPOTENCY_TTL_HOURS_ENV: &str = "IDEMPOTENCY_TTL_HOURS";

/// Environment lookups used by [`IdempotencyConfig`].
///
/// Lets tests supply values without mutating the process environment.
pub trait IdempotencyEnv {
    /// Fetch a string value by name.
    fn string(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultIdempotencyEnv;

impl IdempotencyEnv for DefaultIdempotencyEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// How long finalize responses stay replayable, and how long an unfinished
/// claim blocks its key.
///
/// # Example
///
/// ```
/// # use payroll::domain::idempotency::IdempotencyConfig;
/// # use std::time::Duration;
/// assert_eq!(IdempotencyConfig::default().ttl(), Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
    claim_lease: Duration,
}

impl IdempotencyConfig {
    const DEFAULT_TTL_HOURS: u64 = 24;
    const MIN_TTL_HOURS: u64 = 1;
    /// Ten years.
    const MAX_TTL_HOURS: u64 = 24 * 365 * 10;
    const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(5 * 60);

    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(&DefaultIdempotencyEnv)
    }

    /// Load from a custom environment source.
    ///
    /// Unparseable values fall back to 24 hours; parsed values are clamped
    /// to `1..=87600`.
    pub fn from_env_with(env: &impl IdempotencyEnv) -> Self {
        let hours = env
            .string(IDEMPOTENCY_TTL_HOURS_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TTL_HOURS)
            .clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS);
        Self::with_ttl(Duration::from_secs(hours.saturating_mul(3600)))
    }

    /// Explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            claim_lease: Self::DEFAULT_CLAIM_LEASE,
        }
    }

    /// Replace the in-progress lease.
    #[must_use]
    pub fn with_claim_lease(mut self, claim_lease: Duration) -> Self {
        self.claim_lease = claim_lease;
        self
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How long a claim without a cached response blocks its key. Never
    /// longer than the TTL.
    pub fn claim_lease(&self) -> Duration {
        self.claim_lease.min(self.ttl)
    }

    /// TTL as a chrono duration for expiry arithmetic.
    pub fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// Claim lease as a chrono duration.
    pub fn claim_lease_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.claim_lease()).unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(Self::DEFAULT_TTL_HOURS * 3600))
    }
}
