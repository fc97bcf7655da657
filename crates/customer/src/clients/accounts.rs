//! Accounts/identity service client.
//!
//! The accounts service is the system of record for login credentials and
//! canonical customer UUIDs. All calls except `login` carry the cached
//! service bearer credential as an `Authorization` header; a 401/403
//! response is classified as [`AccountsError::Forbidden`] so the retry
//! wrapper can distinguish an expired credential from other failures.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use skyward_core::{CustomerId, Email};

use crate::models::DeletionRequest;

/// Errors that can occur when calling the accounts service.
#[derive(Debug, Error)]
pub enum AccountsError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the bearer credential (401/403).
    ///
    /// Consumed by the retry wrapper; everything else propagates.
    #[error("credential rejected by accounts service (status {status})")]
    Forbidden { status: u16 },

    /// Any other non-2xx response.
    #[error("accounts service error (status {status}): {body}")]
    Unexpected { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode accounts service response: {0}")]
    Decode(String),
}

/// Successful login response: a bearer token and its expiry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Expiry as epoch milliseconds.
    pub expires_at: i64,
}

/// Contract for the accounts/identity service.
///
/// `create_account` and `complete_deletion` return `None` when the service
/// responds 2xx but without a customer UUID in the body; the orchestrator
/// turns that into a provisioning/confirmation failure.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AccountsError>;

    async fn create_account(
        &self,
        auth: &str,
        email: &Email,
        password: &str,
    ) -> Result<Option<CustomerId>, AccountsError>;

    async fn update_email(
        &self,
        auth: &str,
        customer_id: CustomerId,
        new_email: &Email,
    ) -> Result<(), AccountsError>;

    async fn request_deletion(
        &self,
        auth: &str,
        request: &DeletionRequest,
    ) -> Result<(), AccountsError>;

    async fn complete_deletion(
        &self,
        auth: &str,
        confirmation_token: Uuid,
    ) -> Result<Option<CustomerId>, AccountsError>;
}

/// Map a non-success status to the corresponding error.
fn classify(status: StatusCode, body: String) -> AccountsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AccountsError::Forbidden {
            status: status.as_u16(),
        },
        _ => AccountsError::Unexpected {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct UpdateEmailRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct DeletionRequestBody<'a> {
    id: CustomerId,
    email: &'a str,
    password: &'a str,
}

/// Reqwest-backed client for the accounts service.
#[derive(Clone)]
pub struct AccountsClient {
    client: reqwest::Client,
    base_url: Url,
}

impl AccountsClient {
    /// Create a new accounts service client.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Read an optional UUID from a 2xx response body.
    ///
    /// The accounts service returns the new/deleted customer UUID as a JSON
    /// string, or an empty body when it has nothing to report.
    async fn read_optional_uuid(
        response: reqwest::Response,
    ) -> Result<Option<CustomerId>, AccountsError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let uuid: Uuid = serde_json::from_str(&text)
            .map_err(|e| AccountsError::Decode(format!("expected a UUID body: {e}")))?;
        Ok(Some(CustomerId::new(uuid)))
    }
}

#[async_trait]
impl AccountsApi for AccountsClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AccountsError> {
        let response = self
            .client
            .post(self.endpoint("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| AccountsError::Decode(e.to_string()))?;
        Ok(login)
    }

    async fn create_account(
        &self,
        auth: &str,
        email: &Email,
        password: &str,
    ) -> Result<Option<CustomerId>, AccountsError> {
        let response = self
            .client
            .post(self.endpoint("accounts"))
            .header("Authorization", auth)
            .json(&CreateAccountRequest {
                email: email.as_str(),
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }

        Self::read_optional_uuid(response).await
    }

    async fn update_email(
        &self,
        auth: &str,
        customer_id: CustomerId,
        new_email: &Email,
    ) -> Result<(), AccountsError> {
        let response = self
            .client
            .put(self.endpoint(&format!("accounts/{customer_id}/email")))
            .header("Authorization", auth)
            .json(&UpdateEmailRequest {
                email: new_email.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }
        Ok(())
    }

    async fn request_deletion(
        &self,
        auth: &str,
        request: &DeletionRequest,
    ) -> Result<(), AccountsError> {
        use secrecy::ExposeSecret;

        let response = self
            .client
            .delete(self.endpoint("accounts/customer"))
            .header("Authorization", auth)
            .json(&DeletionRequestBody {
                id: request.customer_id,
                email: request.email.as_str(),
                password: request.password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }
        Ok(())
    }

    async fn complete_deletion(
        &self,
        auth: &str,
        confirmation_token: Uuid,
    ) -> Result<Option<CustomerId>, AccountsError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("accounts/customer/{confirmation_token}")))
            .header("Authorization", auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, body));
        }

        Self::read_optional_uuid(response).await
    }
}
