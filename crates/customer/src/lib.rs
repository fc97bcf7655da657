//! Customer lifecycle orchestration for the Skyward platform.
//!
//! Coordinates three systems of record: the accounts service (credentials
//! and canonical customer ids), the payment processor (billing profiles and
//! tokenized cards), and a local repository holding the rest of the
//! customer aggregate. All service-to-service calls authenticate with a
//! cached bearer credential and recover once from a mid-flight expiry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use config::CustomerServiceConfig;
pub use error::{Result, ServiceError};
pub use services::{AccountDeletionService, CustomerService};
pub use services::auth::CredentialCache;
