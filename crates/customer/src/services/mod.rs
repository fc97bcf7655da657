//! Orchestration services.
//!
//! [`CustomerService`] drives the customer lifecycle across the accounts
//! service, the payment processor, and the local repository;
//! [`AccountDeletionService`] layers the two-phase deletion protocol on top
//! of it. Both authenticate through the shared [`auth::CredentialCache`].

pub mod auth;
mod customers;
mod deletion;

pub use customers::CustomerService;
pub use deletion::AccountDeletionService;
