//! Local repository for the customer aggregate.
//!
//! The repository is a keyed store and nothing more: the orchestrator loads
//! a full aggregate, mutates it, and saves it back. Query mechanics,
//! durability, and optimistic concurrency are the implementation's concern,
//! not part of this contract. An in-memory implementation is provided in
//! [`memory`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use skyward_core::{CustomerId, Email};

use crate::models::Customer;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Keyed store for [`Customer`] aggregates.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// Persist an aggregate, assigning surrogate ids to any payment
    /// instruments that do not have one yet. Returns the stored value.
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError>;

    async fn delete(&self, customer: &Customer) -> Result<(), RepositoryError>;
}
