//! Correlation identifier shared by logs, error bodies and the `trace-id`
//! response header.
//!
//! The identifier lives in Tokio task-local storage for the duration of a
//! request. Task locals do not follow `tokio::spawn` or `spawn_blocking`;
//! wrap such work in [`TraceId::scope`] to keep the identifier.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header carrying the identifier, both from the gateway and in responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    pub(crate) static TRACE_ID: TraceId;
}

/// Request-scoped trace identifier.
///
/// # Examples
/// ```
/// use payroll::TraceId;
///
/// async fn handler() -> Option<String> {
///     TraceId::current().map(|id| id.to_string())
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Adopt the gateway's identifier when it is a UUID, otherwise mint one.
    ///
    /// ```
    /// use payroll::TraceId;
    ///
    /// let upstream = "6f9b1a8e-1d2c-4b5a-9e8f-0a1b2c3d4e5f";
    /// assert_eq!(TraceId::from_upstream(Some(upstream)).to_string(), upstream);
    /// assert_ne!(TraceId::from_upstream(Some("req-42")).to_string(), "req-42");
    /// ```
    #[must_use]
    pub fn from_upstream(header: Option<&str>) -> Self {
        header
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Identifier of the request being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("gateway-7"))]
    fn unusable_upstream_values_are_replaced(#[case] header: Option<&str>) {
        let minted = TraceId::from_upstream(header);
        assert_ne!(minted.as_uuid(), &Uuid::nil());
    }

    #[rstest]
    fn upstream_uuid_is_kept_after_trimming() {
        let uuid = Uuid::new_v4();
        let adopted = TraceId::from_upstream(Some(&format!(" {uuid} ")));
        assert_eq!(adopted.as_uuid(), &uuid);
    }
}
