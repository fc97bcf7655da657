//! Single-shot recovery from an expired service credential.

use std::future::Future;

use super::CredentialCache;
use crate::error::ServiceError;

/// Run `op` once; if it fails because a downstream service rejected the
/// bearer credential, force one refresh and run it exactly once more.
///
/// Any other failure, or a second rejection after the retry, propagates
/// unchanged. There is no loop and no backoff: this recovers only from a
/// credential expiring between cache-check and network call, and `op` must
/// be idempotent or safe to repeat.
///
/// # Errors
///
/// Returns the operation's error, or an authentication failure if the
/// forced refresh itself fails.
pub async fn run_with_retry<T, F, Fut>(cache: &CredentialCache, op: F) -> Result<T, ServiceError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    match op().await {
        Err(err) if err.is_credential_rejection() => {
            tracing::info!("downstream rejected service credential; refreshing and retrying once");
            cache.force_refresh().await?;
            op().await
        }
        other => other,
    }
}
