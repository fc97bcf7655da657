//! Payment processor client.
//!
//! The processor is the PCI boundary: raw card data is forwarded once for
//! tokenization and never stored locally. Billing profiles and card tokens
//! are referenced by opaque processor ids.
//!
//! Vendor failures keep the processor's error code and category so that
//! client-visible diagnostics (e.g. a declined card) survive the trip
//! through the orchestrator.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use skyward_core::{BillingProfileId, CardTokenId, Email};

use crate::config::PaymentConfig;
use crate::models::{Address, CardDetails, CardSummary};

/// Errors that can occur when calling the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor returned an error response.
    ///
    /// `code` and `category` carry the vendor's failure classification
    /// (e.g. `card_declined` / `card_error`).
    #[error("payment processor error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        category: Option<String>,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode payment processor response: {0}")]
    Decode(String),
}

/// A tokenized card as reported by the processor.
#[derive(Debug, Clone)]
pub struct CardToken {
    pub id: CardTokenId,
    pub card: CardSummary,
    /// Billing profile the token is attached to, if any.
    pub attached_profile: Option<BillingProfileId>,
}

/// Contract for the payment processor.
#[async_trait]
pub trait PaymentProcessorApi: Send + Sync {
    async fn create_billing_profile(
        &self,
        email: &Email,
        name: &str,
        phone: &str,
        address: &Address,
    ) -> Result<BillingProfileId, PaymentError>;

    async fn update_billing_profile(
        &self,
        profile_id: &BillingProfileId,
        email: &Email,
        name: &str,
        phone: &str,
        address: &Address,
    ) -> Result<(), PaymentError>;

    async fn delete_billing_profile(
        &self,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError>;

    async fn tokenize_card(&self, card: &CardDetails) -> Result<CardTokenId, PaymentError>;

    async fn attach_token(
        &self,
        token_id: &CardTokenId,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError>;

    async fn detach_token(&self, token_id: &CardTokenId) -> Result<(), PaymentError>;

    async fn retrieve_token(&self, token_id: &CardTokenId) -> Result<CardToken, PaymentError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: VendorError,
}

#[derive(Debug, Deserialize)]
struct VendorError {
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "type")]
    category: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id: String,
    card: WireCard,
    #[serde(default)]
    customer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCard {
    brand: String,
    exp_month: i64,
    exp_year: i64,
    last4: String,
}

/// Parse a processor error body, preserving the vendor code/category.
fn vendor_error(status: u16, body: &str) -> PaymentError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => PaymentError::Api {
            status,
            code: envelope.error.code.unwrap_or_else(|| "unknown".to_owned()),
            category: envelope.error.category,
            message: envelope.error.message.unwrap_or_default(),
        },
        Err(_) => PaymentError::Api {
            status,
            code: "unknown".to_owned(),
            category: None,
            message: body.to_owned(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Reqwest-backed payment processor client.
///
/// Requests are form-encoded with a bearer API key, in the processor's REST
/// convention.
#[derive(Clone)]
pub struct PaymentProcessorClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PaymentProcessorClient {
    /// Create a new payment processor client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key cannot form a valid header or the
    /// HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let headers = default_headers(&config.api_key)?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(vendor_error(status.as_u16(), &body))
    }
}

fn default_headers(api_key: &SecretString) -> Result<HeaderMap, PaymentError> {
    let mut headers = HeaderMap::new();
    let auth_value = format!("Bearer {}", api_key.expose_secret());
    let mut value = HeaderValue::from_str(&auth_value)
        .map_err(|e| PaymentError::Decode(format!("invalid API key format: {e}")))?;
    value.set_sensitive(true);
    headers.insert("Authorization", value);
    Ok(headers)
}

/// Billing profile fields as form parameters.
fn profile_params<'a>(
    email: &'a Email,
    name: &'a str,
    phone: &'a str,
    address: &'a Address,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![
        ("email", email.as_str()),
        ("name", name),
        ("phone", phone),
        ("address[line1]", address.line1.as_str()),
        ("address[city]", address.city.as_str()),
        ("address[state]", address.state.as_str()),
        ("address[postal_code]", address.zipcode.as_str()),
    ];
    if let Some(line2) = address.line2.as_deref() {
        params.push(("address[line2]", line2));
    }
    params
}

#[async_trait]
impl PaymentProcessorApi for PaymentProcessorClient {
    async fn create_billing_profile(
        &self,
        email: &Email,
        name: &str,
        phone: &str,
        address: &Address,
    ) -> Result<BillingProfileId, PaymentError> {
        let response = self
            .client
            .post(self.endpoint("customers"))
            .form(&profile_params(email, name, phone, address))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let profile: ProfileResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))?;
        Ok(BillingProfileId::new(profile.id))
    }

    async fn update_billing_profile(
        &self,
        profile_id: &BillingProfileId,
        email: &Email,
        name: &str,
        phone: &str,
        address: &Address,
    ) -> Result<(), PaymentError> {
        let response = self
            .client
            .post(self.endpoint(&format!("customers/{}", profile_id.as_str())))
            .form(&profile_params(email, name, phone, address))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_billing_profile(
        &self,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("customers/{}", profile_id.as_str())))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn tokenize_card(&self, card: &CardDetails) -> Result<CardTokenId, PaymentError> {
        let exp_month = card.exp_month.to_string();
        let exp_year = card.exp_year.to_string();
        let params = [
            ("type", "card"),
            ("card[number]", card.number.expose_secret()),
            ("card[exp_month]", exp_month.as_str()),
            ("card[exp_year]", exp_year.as_str()),
            ("card[cvc]", card.cvc.expose_secret()),
        ];

        let response = self
            .client
            .post(self.endpoint("payment_methods"))
            .form(&params)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))?;
        Ok(CardTokenId::new(token.id))
    }

    async fn attach_token(
        &self,
        token_id: &CardTokenId,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError> {
        let params = [("customer", profile_id.as_str())];
        let response = self
            .client
            .post(self.endpoint(&format!("payment_methods/{}/attach", token_id.as_str())))
            .form(&params)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn detach_token(&self, token_id: &CardTokenId) -> Result<(), PaymentError> {
        let response = self
            .client
            .post(self.endpoint(&format!("payment_methods/{}/detach", token_id.as_str())))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn retrieve_token(&self, token_id: &CardTokenId) -> Result<CardToken, PaymentError> {
        let response = self
            .client
            .get(self.endpoint(&format!("payment_methods/{}", token_id.as_str())))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))?;

        Ok(CardToken {
            id: CardTokenId::new(token.id),
            card: CardSummary {
                brand: token.card.brand,
                exp_month: token.card.exp_month,
                exp_year: token.card.exp_year,
                last4: token.card.last4,
            },
            attached_profile: token.customer.map(BillingProfileId::new),
        })
    }
}
