//! Authentication error types.

use thiserror::Error;

use crate::clients::AccountsError;

/// Errors that can occur while obtaining the service bearer credential.
///
/// None of these are retried automatically: a failed service login means
/// every authenticated call is going to fail until an operator intervenes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Service-identity email or password is missing or blank. Detected
    /// before any network call is attempted.
    #[error("service credentials are not configured")]
    MissingCredentials,

    /// The login call itself failed (network error or non-2xx).
    #[error("service login failed: {0}")]
    Login(#[source] AccountsError),

    /// The login response carried no usable token.
    #[error("login response contained no token")]
    MissingToken,

    /// The login response carried an expiry outside the representable range.
    #[error("login response carried an invalid expiry: {0}")]
    InvalidExpiry(i64),
}
