//! Core types for the Skyward customer platform.
//!
//! This module provides type-safe wrappers for common domain concepts.

mod email;
mod id;

pub use email::{Email, EmailError};
pub use id::{BillingProfileId, CardTokenId, CustomerId, PaymentInstrumentId};
