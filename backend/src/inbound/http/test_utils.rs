//! Test helpers for inbound HTTP components.

use actix_web::test::TestRequest;

use crate::inbound::http::actor::{TENANT_ID_HEADER, USER_ID_HEADER};
use crate::inbound::http::state::HttpState;

/// Tenant sent by [`with_actor`].
pub const TEST_TENANT_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
/// User sent by [`with_actor`].
pub const TEST_USER_ID: &str = "9b2e6c1a-4f0d-4e8a-9a51-2d1c6b7e8f90";

/// Attach the gateway identity headers to a test request.
pub fn with_actor(request: TestRequest) -> TestRequest {
    request
        .insert_header((TENANT_ID_HEADER, TEST_TENANT_ID))
        .insert_header((USER_ID_HEADER, TEST_USER_ID))
}

/// Fixture-backed handler state.
pub fn test_state() -> HttpState {
    HttpState::default()
}
