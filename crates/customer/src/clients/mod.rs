//! HTTP clients for the external collaborators.
//!
//! Both clients are stateless wrappers: every authenticated call receives
//! the bearer credential from the caller, so the clients themselves hold no
//! mutable state and are cheap to share.

pub mod accounts;
pub mod payment;

pub use accounts::{AccountsApi, AccountsClient, AccountsError, LoginResponse};
pub use payment::{CardToken, PaymentError, PaymentProcessorApi, PaymentProcessorClient};
