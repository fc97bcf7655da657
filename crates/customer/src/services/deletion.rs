//! Two-phase account deletion.
//!
//! Phase A forwards the customer's deletion request to the accounts
//! service, which verifies the re-entered password and emails the customer
//! a confirmation token. Nothing changes locally in phase A. Phase B
//! redeems that token: the accounts service deletes its record and reports
//! back which customer it belonged to, and only then are the billing
//! profile and local record removed. Token issuance, expiry, and
//! single-use redemption are all enforced by the accounts service.

use std::sync::Arc;

use uuid::Uuid;

use skyward_core::CustomerId;

use crate::clients::AccountsApi;
use crate::error::{Result, ServiceError};
use crate::models::DeletionRequest;
use crate::services::auth::{CredentialCache, run_with_retry};
use crate::services::customers::CustomerService;

/// Drives the two-phase deletion protocol against the accounts service.
pub struct AccountDeletionService {
    accounts: Arc<dyn AccountsApi>,
    customers: Arc<CustomerService>,
    credentials: Arc<CredentialCache>,
}

impl AccountDeletionService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountsApi>,
        customers: Arc<CustomerService>,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            accounts,
            customers,
            credentials,
        }
    }

    /// Phase A: forward the deletion request to the accounts service.
    ///
    /// On success the accounts service emails the customer a confirmation
    /// token; no local state changes here.
    ///
    /// # Errors
    ///
    /// Accounts-service failures propagate; a credential rejection is
    /// retried once after a forced refresh.
    pub async fn request_deletion(&self, request: &DeletionRequest) -> Result<()> {
        run_with_retry(&self.credentials, || self.forward_request(request)).await?;
        tracing::info!(customer = %request.customer_id, "deletion requested; awaiting confirmation");
        Ok(())
    }

    async fn forward_request(&self, request: &DeletionRequest) -> Result<()> {
        let auth = self.credentials.bearer().await?;
        Ok(self.accounts.request_deletion(&auth, request).await?)
    }

    /// Phase B: redeem a confirmation token and tear the customer down.
    ///
    /// The accounts service deletes its record during redemption, so by the
    /// time this method removes the billing profile and local record the
    /// account is already gone. Returns the id of the deleted customer.
    ///
    /// # Errors
    ///
    /// `DeletionConfirmation` if the accounts service redeems the token but
    /// reports no customer id; the account may already be deleted with the
    /// local record now orphaned, which needs operator attention.
    pub async fn finalize_deletion(&self, confirmation_token: Uuid) -> Result<CustomerId> {
        let redeemed =
            run_with_retry(&self.credentials, || self.redeem(confirmation_token)).await?;

        let Some(id) = redeemed else {
            tracing::error!(
                token = %confirmation_token,
                "token redemption returned no customer id; local record may be orphaned"
            );
            return Err(ServiceError::DeletionConfirmation {
                token: confirmation_token,
            });
        };

        self.customers.remove_customer(id).await?;
        Ok(id)
    }

    async fn redeem(&self, confirmation_token: Uuid) -> Result<Option<CustomerId>> {
        let auth = self.credentials.bearer().await?;
        Ok(self
            .accounts
            .complete_deletion(&auth, confirmation_token)
            .await?)
    }
}
