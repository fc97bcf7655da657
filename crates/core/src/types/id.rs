//! Newtype IDs for type-safe entity references.
//!
//! Three id shapes exist in this system, each issued by a different owner:
//! UUIDs minted by the remote accounts service ([`CustomerId`]), i64
//! surrogates assigned by the local repository ([`PaymentInstrumentId`]),
//! and opaque strings issued by the payment processor (via
//! [`define_opaque_id!`]).

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical customer identifier.
///
/// Always assigned by the remote accounts service; never generated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Wrap a UUID returned by the accounts service.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CustomerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<CustomerId> for Uuid {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

/// Local surrogate id for a payment instrument record.
///
/// Assigned by the repository when the owning customer aggregate is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentInstrumentId(i64);

impl PaymentInstrumentId {
    /// Create an id from an i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PaymentInstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PaymentInstrumentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<PaymentInstrumentId> for i64 {
    fn from(id: PaymentInstrumentId) -> Self {
        id.0
    }
}

/// Macro to define a type-safe wrapper for an opaque string id.
///
/// Used for identifiers issued by external systems where the value has no
/// local structure (e.g. payment processor references). Creates a newtype
/// around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `into_inner()` accessors
/// - `Display` and `From<String>`/`From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use skyward_core::define_opaque_id;
/// define_opaque_id!(WarehouseRef);
///
/// let a = WarehouseRef::new("wh_123");
/// assert_eq!(a.as_str(), "wh_123");
/// ```
#[macro_export]
macro_rules! define_opaque_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an externally issued identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Processor-issued references
define_opaque_id!(BillingProfileId);
define_opaque_id!(CardTokenId);
