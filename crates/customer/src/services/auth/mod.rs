//! Service-to-service authentication.
//!
//! The orchestrator authenticates against the accounts service with a fixed
//! service identity and shares the resulting bearer credential across all
//! concurrent operations. [`CredentialCache`] owns that credential;
//! [`run_with_retry`] recovers from the single most common transient
//! failure, a credential expiring between cache-check and network call.

mod error;
mod retry;

pub use error::AuthError;
pub use retry::run_with_retry;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use tokio::sync::RwLock;

use crate::clients::AccountsApi;
use crate::config::ServiceIdentityConfig;

/// Tokens within this window of expiry are treated as stale by `bearer`.
const REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// `force_refresh` is a no-op while the token has more validity than this.
///
/// Guards against a storm of concurrent forced refreshes after a single
/// transient 403.
const FORCE_REFRESH_SKIP_SECS: i64 = 60 * 60;

#[derive(Clone)]
struct CachedCredential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedCredential {
    fn valid_for_more_than(&self, now: DateTime<Utc>, secs: i64) -> bool {
        self.expires_at > now + Duration::seconds(secs)
    }
}

/// Process-wide cache for the service bearer credential.
///
/// Readers holding a still-valid token never block on each other; a refresh
/// takes the write lock, so it is mutually exclusive with other refreshes
/// and no reader can observe a torn (token, expiry) pair.
pub struct CredentialCache {
    accounts: Arc<dyn AccountsApi>,
    identity: ServiceIdentityConfig,
    state: RwLock<Option<CachedCredential>>,
}

impl CredentialCache {
    /// Create an empty cache; the first `bearer` call performs the login.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountsApi>, identity: ServiceIdentityConfig) -> Self {
        Self {
            accounts,
            identity,
            state: RwLock::new(None),
        }
    }

    /// Get a usable bearer credential, logging in if the cached one is
    /// absent or within the expiry buffer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the service credentials are blank or the
    /// login fails; login failures are never retried automatically.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        {
            let state = self.state.read().await;
            if let Some(cached) = state.as_ref()
                && cached.valid_for_more_than(Utc::now(), REFRESH_BUFFER_SECS)
            {
                return Ok(cached.token.clone());
            }
        }

        let mut state = self.state.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = state.as_ref()
            && cached.valid_for_more_than(Utc::now(), REFRESH_BUFFER_SECS)
        {
            return Ok(cached.token.clone());
        }

        let fresh = self.login().await?;
        let token = fresh.token.clone();
        *state = Some(fresh);
        Ok(token)
    }

    /// Refresh the credential unconditionally, unless the cached one still
    /// has more than an hour of validity remaining.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the service credentials are blank or the
    /// login fails.
    pub async fn force_refresh(&self) -> Result<(), AuthError> {
        let mut state = self.state.write().await;

        if let Some(cached) = state.as_ref()
            && cached.valid_for_more_than(Utc::now(), FORCE_REFRESH_SKIP_SECS)
        {
            tracing::warn!("forced refresh requested but credential is not near expiry; skipping");
            return Ok(());
        }

        let fresh = self.login().await?;
        *state = Some(fresh);
        Ok(())
    }

    async fn login(&self) -> Result<CachedCredential, AuthError> {
        let email = self.identity.email.trim();
        let password = self.identity.password.expose_secret();
        if email.is_empty() || password.trim().is_empty() {
            tracing::error!("service credentials are blank; cannot authenticate");
            return Err(AuthError::MissingCredentials);
        }

        tracing::info!("refreshing service credential");
        let response = self
            .accounts
            .login(email, password)
            .await
            .map_err(AuthError::Login)?;

        if response.token.trim().is_empty() {
            tracing::error!("login response contained no token; authenticated calls will fail");
            return Err(AuthError::MissingToken);
        }

        let expires_at = DateTime::from_timestamp_millis(response.expires_at)
            .ok_or(AuthError::InvalidExpiry(response.expires_at))?;

        Ok(CachedCredential {
            token: response.token,
            expires_at,
        })
    }
}
