//! Gateway identity extraction.
//!
//! Authentication terminates at the gateway, which forwards the acting
//! tenant and user as `X-Tenant-Id` and `X-User-Id`. Handlers take an
//! [`Actor`] argument and pass the wrapped [`ActorContext`] to services.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use serde_json::json;

use crate::domain::{ActorContext, Error, TenantId, UserId};

/// Header carrying the acting tenant.
pub const TENANT_ID_HEADER: &str = "X-Tenant-Id";
/// Header carrying the acting user.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extractor wrapping the request's [`ActorContext`].
#[derive(Debug, Clone)]
pub struct Actor(ActorContext);

impl Actor {
    /// Borrow the actor context.
    pub fn context(&self) -> &ActorContext {
        &self.0
    }

    /// Unwrap into the actor context.
    pub fn into_inner(self) -> ActorContext {
        self.0
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, Error> {
    headers
        .get(name)
        .ok_or_else(|| {
            Error::unauthorized(format!("missing {name} header"))
                .with_details(json!({ "header": name }))
        })?
        .to_str()
        .map_err(|_| {
            Error::unauthorized(format!("{name} header is not valid text"))
                .with_details(json!({ "header": name }))
        })
}

fn invalid_identity(name: &'static str) -> Error {
    Error::unauthorized(format!("{name} header must be a valid UUID"))
        .with_details(json!({ "header": name }))
}

/// Read the gateway identity headers.
///
/// # Errors
///
/// Returns an `unauthorized` error when either header is missing or is not
/// a UUID.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<ActorContext, Error> {
    let tenant_id = TenantId::new(header(headers, TENANT_ID_HEADER)?)
        .map_err(|_| invalid_identity(TENANT_ID_HEADER))?;
    let user_id = UserId::new(header(headers, USER_ID_HEADER)?)
        .map_err(|_| invalid_identity(USER_ID_HEADER))?;
    Ok(ActorContext::new(tenant_id, user_id))
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_from_headers(req.headers()).map(Actor))
    }
}
