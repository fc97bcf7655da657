//! Customer lifecycle orchestration.
//!
//! Each operation loads the aggregate from the repository, coordinates the
//! accounts service and payment processor as needed, and saves the result.
//! There is no cross-service transaction: remote calls are ordered so that
//! a failure leaves at worst an orphaned remote resource, never a local
//! record pointing at something that does not exist.

use std::sync::Arc;

use skyward_core::{CustomerId, Email, PaymentInstrumentId};

use crate::clients::{AccountsApi, PaymentProcessorApi};
use crate::db::CustomerRepository;
use crate::error::{Result, ServiceError};
use crate::models::{
    CardDetails, Customer, CustomerUpdate, LoyaltyAdjustment, NewCustomer, PaymentInstrument,
};
use crate::services::auth::{CredentialCache, run_with_retry};

/// Orchestrates the customer lifecycle across the accounts service, the
/// payment processor, and the local repository.
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
    accounts: Arc<dyn AccountsApi>,
    processor: Arc<dyn PaymentProcessorApi>,
    credentials: Arc<CredentialCache>,
}

impl CustomerService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        accounts: Arc<dyn AccountsApi>,
        processor: Arc<dyn PaymentProcessorApi>,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            repository,
            accounts,
            processor,
            credentials,
        }
    }

    /// All customer records.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository read fails.
    pub async fn all_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.repository.find_all().await?)
    }

    /// The customer with the given id.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if no such record exists.
    pub async fn customer_by_id(&self, id: CustomerId) -> Result<Customer> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NoSuchCustomerId(id))
    }

    /// The customer with the given email.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerEmail` if no such record exists.
    pub async fn customer_by_email(&self, email: &Email) -> Result<Customer> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NoSuchCustomerEmail(email.clone()))
    }

    /// Create a customer across all three systems.
    ///
    /// Order matters: the email uniqueness pre-check runs before any remote
    /// call, the billing profile is created before the account so the local
    /// record can reference both, and the local save comes last. A failure
    /// after the billing profile exists orphans it at the processor; that
    /// is logged and accepted rather than compensated.
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` if a customer with this email already exists, and
    /// `AccountProvisioning` if the accounts service accepts the account
    /// but returns no customer id.
    pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        if self.repository.find_by_email(&new.email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail(new.email));
        }

        let full_name = format!("{} {}", new.first_name, new.last_name);
        let billing_profile_id = self
            .processor
            .create_billing_profile(&new.email, &full_name, &new.phone, &new.address)
            .await?;

        let provisioned =
            run_with_retry(&self.credentials, || self.provision_account(&new)).await?;
        let Some(id) = provisioned else {
            tracing::error!(
                email = %new.email,
                billing_profile = billing_profile_id.as_str(),
                "account creation returned no customer id; billing profile is orphaned"
            );
            return Err(ServiceError::AccountProvisioning { email: new.email });
        };

        tracing::info!(customer = %id, "provisioned new customer account");

        let customer = Customer {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            loyalty_points: 0,
            billing_profile_id,
            addresses: vec![new.address],
            payment_instruments: vec![],
            ticket_emails: new.ticket_emails,
            flight_emails: new.flight_emails,
        };
        Ok(self.repository.save(customer).await?)
    }

    async fn provision_account(&self, new: &NewCustomer) -> Result<Option<CustomerId>> {
        use secrecy::ExposeSecret;

        let auth = self.credentials.bearer().await?;
        Ok(self
            .accounts
            .create_account(&auth, &new.email, new.password.expose_secret())
            .await?)
    }

    /// Replace a customer's mutable fields, propagating the changes to the
    /// accounts service (email only) and the payment processor.
    ///
    /// The billing profile reference, loyalty balance, and payment
    /// instrument set are carried over from the existing record; callers
    /// cannot change them through this operation.
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` if a different customer already holds the new
    /// email, `NoSuchCustomerId` if the record does not exist.
    pub async fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer> {
        if let Some(other) = self.repository.find_by_email(&update.email).await?
            && other.id != id
        {
            return Err(ServiceError::DuplicateEmail(update.email));
        }

        let existing = self.customer_by_id(id).await?;

        if existing.email != update.email {
            run_with_retry(&self.credentials, || {
                self.push_email_change(id, &update.email)
            })
            .await?;
        }

        self.processor
            .update_billing_profile(
                &existing.billing_profile_id,
                &update.email,
                &update.full_name(),
                &update.phone,
                &update.address,
            )
            .await?;

        let customer = Customer {
            id,
            first_name: update.first_name,
            last_name: update.last_name,
            email: update.email,
            phone: update.phone,
            loyalty_points: existing.loyalty_points,
            billing_profile_id: existing.billing_profile_id,
            addresses: vec![update.address],
            payment_instruments: existing.payment_instruments,
            ticket_emails: update.ticket_emails,
            flight_emails: update.flight_emails,
        };
        Ok(self.repository.save(customer).await?)
    }

    async fn push_email_change(&self, id: CustomerId, new_email: &Email) -> Result<()> {
        let auth = self.credentials.bearer().await?;
        Ok(self.accounts.update_email(&auth, id, new_email).await?)
    }

    /// Delete a customer's billing profile and local record.
    ///
    /// The accounts-service side is handled by the deletion protocol before
    /// this is called; here the billing profile goes first so a failure
    /// never leaves a local record referencing a deleted profile.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if the record does not exist.
    pub async fn remove_customer(&self, id: CustomerId) -> Result<()> {
        let customer = self.customer_by_id(id).await?;

        self.processor
            .delete_billing_profile(&customer.billing_profile_id)
            .await?;
        self.repository.delete(&customer).await?;

        tracing::info!(customer = %id, "deleted customer record and billing profile");
        Ok(())
    }

    /// Tokenize a card at the processor, attach it to the customer's
    /// billing profile, and store the resulting instrument locally.
    ///
    /// The raw card data goes to the processor exactly once and is never
    /// persisted; the stored record holds only the token and the display
    /// metadata the processor reports back.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if the customer does not exist; processor errors
    /// (e.g. a declined card) propagate with their vendor code intact.
    pub async fn add_payment_instrument(
        &self,
        customer_id: CustomerId,
        card: CardDetails,
    ) -> Result<PaymentInstrumentId> {
        let customer = self.customer_by_id(customer_id).await?;

        let token_id = self.processor.tokenize_card(&card).await?;
        self.processor
            .attach_token(&token_id, &customer.billing_profile_id)
            .await?;
        let token = self.processor.retrieve_token(&token_id).await?;

        let mut customer = customer;
        customer.payment_instruments.push(PaymentInstrument {
            id: None,
            owner_id: customer_id,
            token_id: token_id.clone(),
            card: token.card,
            notes: card.notes,
        });
        let saved = self.repository.save(customer).await?;

        // The repository assigns the surrogate id during save; find it back
        // by the processor token, which is unique per instrument.
        let assigned = saved
            .payment_instruments
            .iter()
            .find(|i| i.token_id == token_id)
            .and_then(|i| i.id);
        assigned.ok_or(ServiceError::InstrumentMissingAfterSave { token: token_id })
    }

    /// All payment instruments stored for the customer.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if the customer does not exist.
    pub async fn payment_instruments(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PaymentInstrument>> {
        Ok(self.customer_by_id(customer_id).await?.payment_instruments)
    }

    /// A single payment instrument, re-validating ownership.
    ///
    /// # Errors
    ///
    /// `NoSuchPaymentInstrument` if the instrument does not exist under
    /// this customer or its stored owner does not match.
    pub async fn payment_instrument(
        &self,
        customer_id: CustomerId,
        instrument_id: PaymentInstrumentId,
    ) -> Result<PaymentInstrument> {
        let customer = self.customer_by_id(customer_id).await?;
        Self::owned_instrument(&customer, instrument_id).cloned()
    }

    /// Replace the free-text notes on an instrument. No other field is
    /// touched and the processor is not involved.
    ///
    /// # Errors
    ///
    /// `NoSuchPaymentInstrument` if the instrument does not exist under
    /// this customer.
    pub async fn update_payment_instrument_notes(
        &self,
        customer_id: CustomerId,
        instrument_id: PaymentInstrumentId,
        notes: Option<String>,
    ) -> Result<PaymentInstrument> {
        let mut customer = self.customer_by_id(customer_id).await?;
        let instrument = Self::owned_instrument_mut(&mut customer, instrument_id)?;
        instrument.notes = notes;
        let updated = instrument.clone();

        self.repository.save(customer).await?;
        Ok(updated)
    }

    /// Detach the instrument's token at the processor, then drop the local
    /// record. Detach comes first so a failure never leaves a stored
    /// instrument whose token is gone.
    ///
    /// # Errors
    ///
    /// `NoSuchPaymentInstrument` if the instrument does not exist under
    /// this customer.
    pub async fn remove_payment_instrument(
        &self,
        customer_id: CustomerId,
        instrument_id: PaymentInstrumentId,
    ) -> Result<()> {
        let mut customer = self.customer_by_id(customer_id).await?;
        let token_id = Self::owned_instrument(&customer, instrument_id)?
            .token_id
            .clone();

        self.processor.detach_token(&token_id).await?;

        customer
            .payment_instruments
            .retain(|i| i.id != Some(instrument_id));
        self.repository.save(customer).await?;
        Ok(())
    }

    /// The customer's current loyalty balance.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if the customer does not exist.
    pub async fn loyalty_points(&self, customer_id: CustomerId) -> Result<i64> {
        Ok(self.customer_by_id(customer_id).await?.loyalty_points)
    }

    /// Apply a loyalty adjustment and return the new balance.
    ///
    /// A decrement that would take the balance below zero is rejected with
    /// `IllegalPointChange` and the stored balance is left unchanged.
    ///
    /// # Errors
    ///
    /// `NoSuchCustomerId` if the customer does not exist,
    /// `IllegalPointChange` if the resulting balance would be negative or
    /// not representable.
    pub async fn adjust_loyalty_points(
        &self,
        customer_id: CustomerId,
        adjustment: LoyaltyAdjustment,
    ) -> Result<i64> {
        let mut customer = self.customer_by_id(customer_id).await?;

        // Overflow is rejected the same way as a below-zero result.
        let balance = if adjustment.increment {
            customer.loyalty_points.checked_add(adjustment.points)
        } else {
            customer.loyalty_points.checked_sub(adjustment.points)
        };
        let Some(balance) = balance.filter(|b| *b >= 0) else {
            return Err(ServiceError::IllegalPointChange {
                customer: customer_id,
                current: customer.loyalty_points,
                attempted: adjustment.points,
            });
        };

        customer.loyalty_points = balance;
        self.repository.save(customer).await?;
        Ok(balance)
    }

    fn owned_instrument(
        customer: &Customer,
        instrument_id: PaymentInstrumentId,
    ) -> Result<&PaymentInstrument> {
        customer
            .payment_instruments
            .iter()
            .find(|i| i.id == Some(instrument_id) && i.owner_id == customer.id)
            .ok_or(ServiceError::NoSuchPaymentInstrument {
                customer: customer.id,
                instrument: instrument_id,
            })
    }

    fn owned_instrument_mut(
        customer: &mut Customer,
        instrument_id: PaymentInstrumentId,
    ) -> Result<&mut PaymentInstrument> {
        let id = customer.id;
        customer
            .payment_instruments
            .iter_mut()
            .find(|i| i.id == Some(instrument_id) && i.owner_id == id)
            .ok_or(ServiceError::NoSuchPaymentInstrument {
                customer: id,
                instrument: instrument_id,
            })
    }
}
