//! In-memory customer repository.
//!
//! Keyed `HashMap` store behind a `tokio::sync::RwLock`. Concurrency is
//! last-write-wins; callers needing compare-and-swap semantics should use a
//! different implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use skyward_core::{CustomerId, Email, PaymentInstrumentId};

use super::{CustomerRepository, RepositoryError};
use crate::models::Customer;

#[derive(Default)]
struct Store {
    customers: HashMap<CustomerId, Customer>,
    next_instrument_id: i64,
}

/// In-memory implementation of [`CustomerRepository`].
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    inner: RwLock<Store>,
}

impl InMemoryCustomerRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.customers.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store
            .customers
            .values()
            .find(|c| &c.email == email)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let store = self.inner.read().await;
        Ok(store.customers.values().cloned().collect())
    }

    async fn save(&self, mut customer: Customer) -> Result<Customer, RepositoryError> {
        let mut store = self.inner.write().await;

        // Assign surrogate ids to newly added instruments.
        for instrument in &mut customer.payment_instruments {
            if instrument.id.is_none() {
                store.next_instrument_id += 1;
                instrument.id = Some(PaymentInstrumentId::new(store.next_instrument_id));
            }
        }

        store.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn delete(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut store = self.inner.write().await;
        store.customers.remove(&customer.id);
        Ok(())
    }
}
