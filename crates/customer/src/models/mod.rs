//! Domain models for the customer aggregate and orchestrator inputs.
//!
//! The [`Customer`] aggregate is the unit the orchestrator loads, mutates,
//! and saves per request. Its identity is always assigned by the remote
//! accounts service; its billing profile and card tokens live at the payment
//! processor and are referenced here only by opaque id.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use skyward_core::{BillingProfileId, CardTokenId, CustomerId, Email, PaymentInstrumentId};

/// A customer record as stored in the local repository.
///
/// The local record is one of three views of the customer: the accounts
/// service owns credentials and the canonical id, the payment processor owns
/// the billing profile and tokenized cards, and this aggregate holds
/// everything else plus references into the other two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Canonical id, issued by the accounts service at creation.
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all customers; enforced by the orchestrator's
    /// pre-check, not by the repository alone.
    pub email: Email,
    pub phone: String,
    /// Never negative.
    pub loyalty_points: i64,
    /// Processor-side billing profile reference. Set once at creation.
    pub billing_profile_id: BillingProfileId,
    pub addresses: Vec<Address>,
    pub payment_instruments: Vec<PaymentInstrument>,
    pub ticket_emails: bool,
    pub flight_emails: bool,
}

impl Customer {
    /// Full name as sent to the payment processor's billing profile.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Primary postal address, if any (lowest cardinality tag wins).
    #[must_use]
    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().min_by_key(|a| a.cardinality)
    }
}

/// A postal address owned by exactly one customer.
///
/// No independent lifecycle; it is stored and deleted with the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Ordering tag within the owning customer's address set.
    pub cardinality: i32,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

/// A tokenized payment card owned by exactly one customer.
///
/// The raw card number and CVC are forwarded to the payment processor once
/// and never stored; only the processor token and display metadata are kept
/// locally. The metadata is fetched once at creation and never
/// re-synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstrument {
    /// Local surrogate id. `None` until the repository assigns one on save.
    pub id: Option<PaymentInstrumentId>,
    /// Must always match the id of the customer whose aggregate holds this
    /// record; re-validated on every read.
    pub owner_id: CustomerId,
    /// Processor-issued token standing in for the stored card.
    pub token_id: CardTokenId,
    pub card: CardSummary,
    pub notes: Option<String>,
}

/// Display metadata for a tokenized card, as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub brand: String,
    pub exp_month: i64,
    pub exp_year: i64,
    pub last4: String,
}

/// Input for the customer creation flow.
///
/// The password is destined for the accounts service only and is never
/// written to the local repository.
#[derive(Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: SecretString,
    pub phone: String,
    pub address: Address,
    pub ticket_emails: bool,
    pub flight_emails: bool,
}

impl std::fmt::Debug for NewCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCustomer")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("ticket_emails", &self.ticket_emails)
            .field("flight_emails", &self.flight_emails)
            .finish()
    }
}

/// Input for the customer update flow.
///
/// A full replacement of the mutable fields. The billing profile reference
/// and payment instrument set are never supplied by the caller; the
/// orchestrator carries them over from the existing record.
#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: Address,
    pub ticket_emails: bool,
    pub flight_emails: bool,
}

impl CustomerUpdate {
    /// Full name as sent to the payment processor's billing profile.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Raw card data for the add-payment-instrument flow.
///
/// Forwarded to the payment processor for tokenization and then discarded.
#[derive(Clone)]
pub struct CardDetails {
    pub number: SecretString,
    pub exp_month: i64,
    pub exp_year: i64,
    pub cvc: SecretString,
    pub notes: Option<String>,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .field("notes", &self.notes)
            .finish()
    }
}

/// A deletion request forwarded to the accounts service (phase A of the
/// two-phase deletion protocol).
#[derive(Clone)]
pub struct DeletionRequest {
    pub customer_id: CustomerId,
    pub email: Email,
    /// Re-entered by the customer; verified by the accounts service.
    pub password: SecretString,
}

impl std::fmt::Debug for DeletionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionRequest")
            .field("customer_id", &self.customer_id)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A loyalty point adjustment.
#[derive(Debug, Clone, Copy)]
pub struct LoyaltyAdjustment {
    /// Magnitude of the change; expected to be at least 1.
    pub points: i64,
    /// `true` adds points, `false` subtracts them.
    pub increment: bool,
}
