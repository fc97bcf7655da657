//! Unified error handling for the orchestrator.
//!
//! Every operation returns `Result<T, ServiceError>`. Two classifications
//! matter at the boundary:
//!
//! - [`ServiceError::is_client_error`] marks validation-shaped failures that
//!   the (out-of-scope) controller layer translates directly into
//!   client-facing responses. Everything else is an opaque server error;
//!   diagnostic detail stays in logs, not response bodies.
//! - [`ServiceError::is_credential_rejection`] marks the one failure class
//!   the retry wrapper recovers from: a downstream 401/403 meaning the
//!   cached service credential was rejected.

use thiserror::Error;
use uuid::Uuid;

use skyward_core::{CardTokenId, CustomerId, Email, PaymentInstrumentId};

use crate::clients::{AccountsError, PaymentError};
use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Orchestrator-level error type.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No customer with the given id.
    #[error("no customer with id {0}")]
    NoSuchCustomerId(CustomerId),

    /// No customer with the given email.
    #[error("no customer with email {0}")]
    NoSuchCustomerEmail(Email),

    /// No payment instrument with the given id for the given customer, or
    /// the record's owner does not match.
    #[error("no payment instrument {instrument} for customer {customer}")]
    NoSuchPaymentInstrument {
        customer: CustomerId,
        instrument: PaymentInstrumentId,
    },

    /// Another customer already holds this email.
    #[error("a customer with email {0} already exists")]
    DuplicateEmail(Email),

    /// A loyalty decrement would take the balance below zero.
    #[error(
        "cannot subtract {attempted} loyalty points from customer {customer}: balance is {current}"
    )]
    IllegalPointChange {
        customer: CustomerId,
        current: i64,
        attempted: i64,
    },

    /// Service-identity authentication failed. Never retried automatically.
    #[error("authentication failure: {0}")]
    Auth(#[from] AuthError),

    /// Accounts service call failed.
    #[error("accounts service error: {0}")]
    Accounts(#[from] AccountsError),

    /// Payment processor call failed.
    #[error("payment processor error: {0}")]
    Payment(#[from] PaymentError),

    /// Local repository operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The accounts service accepted the account creation but returned no
    /// customer id; the already-created billing profile is orphaned.
    #[error("accounts service returned no customer id while provisioning {email}")]
    AccountProvisioning { email: Email },

    /// The accounts service redeemed a deletion confirmation token but
    /// returned no customer id to delete.
    #[error("deletion confirmation {token} returned no customer id")]
    DeletionConfirmation { token: Uuid },

    /// A just-saved payment instrument could not be found again; indicates
    /// a persistence bug, not caller error.
    #[error("payment instrument for token {token} missing after save")]
    InstrumentMissingAfterSave { token: CardTokenId },
}

impl ServiceError {
    /// True for validation-shaped failures that map directly to
    /// client-facing responses (not found, conflict, bad request, declined
    /// card). Infrastructure failures return false and surface as opaque
    /// server errors.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoSuchCustomerId(_)
                | Self::NoSuchCustomerEmail(_)
                | Self::NoSuchPaymentInstrument { .. }
                | Self::DuplicateEmail(_)
                | Self::IllegalPointChange { .. }
                | Self::Payment(PaymentError::Api { .. })
        )
    }

    /// True when a downstream call was rejected with 401/403, i.e. the
    /// cached service credential expired between cache-check and network
    /// call. This is the only class the retry wrapper recovers from.
    #[must_use]
    pub const fn is_credential_rejection(&self) -> bool {
        matches!(self, Self::Accounts(AccountsError::Forbidden { .. }))
    }
}

/// Result type alias for `ServiceError`.
pub type Result<T> = std::result::Result<T, ServiceError>;
