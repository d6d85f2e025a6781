//! Tenant and user identity carried through every payroll operation.
//!
//! Authentication happens upstream; the gateway forwards the acting tenant
//! and user as UUIDs. [`ActorContext`] bundles both so services never read
//! identity from ambient state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for identity newtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    /// The identifier was empty.
    #[error("identifier must not be empty")]
    EmptyId,
    /// The identifier was not a canonical UUID.
    #[error("identifier must be a valid UUID")]
    InvalidId,
}

macro_rules! define_identity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid, String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
                Self::from_owned(id.as_ref().to_owned())
            }

            /// Wrap an already validated UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid, uuid.to_string())
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self::from_uuid(Uuid::new_v4())
            }

            fn from_owned(id: String) -> Result<Self, IdentityValidationError> {
                if id.is_empty() {
                    return Err(IdentityValidationError::EmptyId);
                }
                if id.trim() != id {
                    return Err(IdentityValidationError::InvalidId);
                }
                let parsed = Uuid::parse_str(&id).map_err(|_| IdentityValidationError::InvalidId)?;
                Ok(Self(parsed, id))
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.1.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.1
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentityValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

define_identity! {
    /// Identifier of the tenant that owns every payroll record.
    TenantId
}

define_identity! {
    /// Identifier of the HR user acting on behalf of a tenant.
    UserId
}

/// Acting tenant and user for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    tenant_id: TenantId,
    user_id: UserId,
}

impl ActorContext {
    /// Bundle the acting tenant and user.
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self { tenant_id, user_id }
    }

    /// Tenant scoping every read and write.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// User performing the action.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity parsing.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn tenant_id_accepts_uuid() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let tenant = TenantId::new(raw).expect("valid tenant id");
        assert_eq!(tenant.as_ref(), raw);
        assert_eq!(tenant.to_string(), raw);
    }

    #[rstest]
    #[case("", IdentityValidationError::EmptyId)]
    #[case("tenant-a", IdentityValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", IdentityValidationError::InvalidId)]
    fn user_id_rejects_malformed_input(
        #[case] raw: &str,
        #[case] expected: IdentityValidationError,
    ) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn serde_uses_plain_strings() {
        let user = UserId::random();
        let json = serde_json::to_string(&user).expect("serialise");
        assert_eq!(json, format!("\"{user}\""));
        let parsed: UserId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(parsed, user);
    }
}
