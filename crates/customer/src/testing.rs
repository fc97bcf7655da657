//! Hand-rolled test doubles for the downstream collaborators.
//!
//! Each mock records the calls it receives and answers from a scripted
//! queue, falling back to a benign default when the queue is empty. Shared
//! across unit tests; the integration tests carry their own copies.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use skyward_core::{BillingProfileId, CardTokenId, CustomerId, Email};

use crate::clients::{
    AccountsApi, AccountsError, CardToken, LoginResponse, PaymentError, PaymentProcessorApi,
};
use crate::models::{Address, CardDetails, CardSummary, DeletionRequest};

// ─────────────────────────────────────────────────────────────────────────────
// Accounts service
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct AccountsState {
    validity_secs: i64,
    fail_next_login: bool,
    empty_token_next: bool,
    create_account_results: VecDeque<Result<Option<CustomerId>, AccountsError>>,
    update_email_results: VecDeque<Result<(), AccountsError>>,
    request_deletion_results: VecDeque<Result<(), AccountsError>>,
    complete_deletion_results: VecDeque<Result<Option<CustomerId>, AccountsError>>,
    created_accounts: Vec<(String, Email)>,
    email_updates: Vec<(CustomerId, Email)>,
    deletion_requests: Vec<CustomerId>,
    redeemed_tokens: Vec<Uuid>,
    auth_headers: Vec<String>,
}

/// Scripted stand-in for the accounts service.
///
/// `login` hands out a distinct token per call so tests can observe a
/// refresh; defaults for the other calls are success with a fresh UUID
/// where one is expected (except `complete_deletion`, which defaults to
/// `Ok(None)` and must be scripted for the happy path).
pub struct MockAccounts {
    pub login_calls: AtomicUsize,
    state: Mutex<AccountsState>,
}

impl MockAccounts {
    pub fn new() -> Self {
        Self {
            login_calls: AtomicUsize::new(0),
            state: Mutex::new(AccountsState {
                validity_secs: 2 * 60 * 60,
                ..AccountsState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AccountsState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Set how long tokens issued by subsequent logins remain valid.
    pub fn set_login_validity_secs(&self, secs: i64) {
        self.lock().validity_secs = secs;
    }

    /// Make the next `login` call fail with a transport-shaped error.
    pub fn fail_next_login(&self) {
        self.lock().fail_next_login = true;
    }

    /// Make the next `login` call succeed but return a blank token.
    pub fn fail_next_login_with_empty_token(&self) {
        self.lock().empty_token_next = true;
    }

    pub fn queue_create_account(&self, result: Result<Option<CustomerId>, AccountsError>) {
        self.lock().create_account_results.push_back(result);
    }

    pub fn queue_update_email(&self, result: Result<(), AccountsError>) {
        self.lock().update_email_results.push_back(result);
    }

    pub fn queue_request_deletion(&self, result: Result<(), AccountsError>) {
        self.lock().request_deletion_results.push_back(result);
    }

    pub fn queue_complete_deletion(&self, result: Result<Option<CustomerId>, AccountsError>) {
        self.lock().complete_deletion_results.push_back(result);
    }

    pub fn created_accounts(&self) -> Vec<(String, Email)> {
        self.lock().created_accounts.clone()
    }

    pub fn email_updates(&self) -> Vec<(CustomerId, Email)> {
        self.lock().email_updates.clone()
    }

    pub fn deletion_requests(&self) -> Vec<CustomerId> {
        self.lock().deletion_requests.clone()
    }

    pub fn redeemed_tokens(&self) -> Vec<Uuid> {
        self.lock().redeemed_tokens.clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.lock().auth_headers.clone()
    }
}

impl Default for MockAccounts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountsApi for MockAccounts {
    async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse, AccountsError> {
        let mut state = self.lock();

        if state.fail_next_login {
            state.fail_next_login = false;
            return Err(AccountsError::Unexpected {
                status: 503,
                body: "login unavailable".to_owned(),
            });
        }

        let call = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let token = if state.empty_token_next {
            state.empty_token_next = false;
            String::new()
        } else {
            format!("Bearer token-{call}")
        };

        Ok(LoginResponse {
            token,
            expires_at: Utc::now().timestamp_millis() + state.validity_secs * 1000,
        })
    }

    async fn create_account(
        &self,
        auth: &str,
        email: &Email,
        _password: &str,
    ) -> Result<Option<CustomerId>, AccountsError> {
        let mut state = self.lock();
        state.auth_headers.push(auth.to_owned());
        let result = state
            .create_account_results
            .pop_front()
            .unwrap_or_else(|| Ok(Some(CustomerId::new(Uuid::new_v4()))));
        if result.is_ok() {
            state.created_accounts.push((auth.to_owned(), email.clone()));
        }
        result
    }

    async fn update_email(
        &self,
        auth: &str,
        customer_id: CustomerId,
        new_email: &Email,
    ) -> Result<(), AccountsError> {
        let mut state = self.lock();
        state.auth_headers.push(auth.to_owned());
        let result = state.update_email_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.email_updates.push((customer_id, new_email.clone()));
        }
        result
    }

    async fn request_deletion(
        &self,
        auth: &str,
        request: &DeletionRequest,
    ) -> Result<(), AccountsError> {
        let mut state = self.lock();
        state.auth_headers.push(auth.to_owned());
        let result = state.request_deletion_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.deletion_requests.push(request.customer_id);
        }
        result
    }

    async fn complete_deletion(
        &self,
        auth: &str,
        confirmation_token: Uuid,
    ) -> Result<Option<CustomerId>, AccountsError> {
        let mut state = self.lock();
        state.auth_headers.push(auth.to_owned());
        let result = state
            .complete_deletion_results
            .pop_front()
            .unwrap_or(Ok(None));
        if result.is_ok() {
            state.redeemed_tokens.push(confirmation_token);
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment processor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ProcessorState {
    next_profile: u64,
    next_token: u64,
    tokens: HashMap<CardTokenId, CardToken>,
    tokenize_results: VecDeque<Result<(), PaymentError>>,
    created_profiles: Vec<Email>,
    updated_profiles: Vec<(BillingProfileId, Email)>,
    deleted_profiles: Vec<BillingProfileId>,
    tokenized_last4: Vec<String>,
    attach_calls: Vec<(CardTokenId, BillingProfileId)>,
    detach_calls: Vec<CardTokenId>,
}

/// Scripted stand-in for the payment processor.
///
/// Tokenization derives a `CardSummary` from the submitted card so that a
/// later `retrieve_token` returns plausible metadata without the mock ever
/// holding the raw number beyond its last four digits.
pub struct MockProcessor {
    state: Mutex<ProcessorState>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProcessorState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProcessorState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make the next `tokenize_card` call fail with the given error.
    pub fn fail_next_tokenize(&self, error: PaymentError) {
        self.lock().tokenize_results.push_back(Err(error));
    }

    pub fn created_profiles(&self) -> Vec<Email> {
        self.lock().created_profiles.clone()
    }

    pub fn updated_profiles(&self) -> Vec<(BillingProfileId, Email)> {
        self.lock().updated_profiles.clone()
    }

    pub fn deleted_profiles(&self) -> Vec<BillingProfileId> {
        self.lock().deleted_profiles.clone()
    }

    pub fn tokenized_last4(&self) -> Vec<String> {
        self.lock().tokenized_last4.clone()
    }

    pub fn attach_calls(&self) -> Vec<(CardTokenId, BillingProfileId)> {
        self.lock().attach_calls.clone()
    }

    pub fn detach_calls(&self) -> Vec<CardTokenId> {
        self.lock().detach_calls.clone()
    }
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn last4_of(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    digits.iter().rev().take(4).rev().collect()
}

#[async_trait]
impl PaymentProcessorApi for MockProcessor {
    async fn create_billing_profile(
        &self,
        email: &Email,
        _name: &str,
        _phone: &str,
        _address: &Address,
    ) -> Result<BillingProfileId, PaymentError> {
        let mut state = self.lock();
        state.next_profile += 1;
        let id = BillingProfileId::new(format!("cus_{}", state.next_profile));
        state.created_profiles.push(email.clone());
        Ok(id)
    }

    async fn update_billing_profile(
        &self,
        profile_id: &BillingProfileId,
        email: &Email,
        _name: &str,
        _phone: &str,
        _address: &Address,
    ) -> Result<(), PaymentError> {
        let mut state = self.lock();
        state
            .updated_profiles
            .push((profile_id.clone(), email.clone()));
        Ok(())
    }

    async fn delete_billing_profile(
        &self,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError> {
        let mut state = self.lock();
        state.deleted_profiles.push(profile_id.clone());
        Ok(())
    }

    async fn tokenize_card(&self, card: &CardDetails) -> Result<CardTokenId, PaymentError> {
        use secrecy::ExposeSecret;

        let mut state = self.lock();
        if let Some(result) = state.tokenize_results.pop_front() {
            result?;
        }

        state.next_token += 1;
        let id = CardTokenId::new(format!("pm_{}", state.next_token));
        let last4 = last4_of(card.number.expose_secret());
        state.tokenized_last4.push(last4.clone());
        state.tokens.insert(
            id.clone(),
            CardToken {
                id: id.clone(),
                card: CardSummary {
                    brand: "visa".to_owned(),
                    exp_month: card.exp_month,
                    exp_year: card.exp_year,
                    last4,
                },
                attached_profile: None,
            },
        );
        Ok(id)
    }

    async fn attach_token(
        &self,
        token_id: &CardTokenId,
        profile_id: &BillingProfileId,
    ) -> Result<(), PaymentError> {
        let mut state = self.lock();
        state
            .attach_calls
            .push((token_id.clone(), profile_id.clone()));
        if let Some(token) = state.tokens.get_mut(token_id) {
            token.attached_profile = Some(profile_id.clone());
        }
        Ok(())
    }

    async fn detach_token(&self, token_id: &CardTokenId) -> Result<(), PaymentError> {
        let mut state = self.lock();
        state.detach_calls.push(token_id.clone());
        if let Some(token) = state.tokens.get_mut(token_id) {
            token.attached_profile = None;
        }
        Ok(())
    }

    async fn retrieve_token(&self, token_id: &CardTokenId) -> Result<CardToken, PaymentError> {
        let state = self.lock();
        state.tokens.get(token_id).cloned().ok_or(PaymentError::Api {
            status: 404,
            code: "resource_missing".to_owned(),
            category: Some("invalid_request_error".to_owned()),
            message: format!("No such payment method: {}", token_id.as_str()),
        })
    }
}
