//! Domain traits defining contracts for external systems.

use std::time::Duration;

use async_trait::async_trait;

use super::error::AppError;
use super::types::{Customer, CustomerId, NewCustomer, Page, PageRequest};

/// Customer persistence operations
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// List every customer
    async fn find_all(&self) -> Result<Vec<Customer>, AppError>;

    /// List one zero-based page of customers along with the total count
    async fn find_page(&self, request: PageRequest) -> Result<Page<Customer>, AppError>;

    /// Get a single customer by ID
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError>;

    /// Check whether any customer already uses this email
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// Check whether a customer with this ID exists
    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, AppError>;

    /// Open a scoped transaction for a mutating operation
    async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, AppError>;
}

/// Unit of work over the customer table.
///
/// Dropping the transaction without calling [`CustomerTransaction::commit`]
/// discards every change made through it.
#[async_trait]
pub trait CustomerTransaction: Send {
    async fn find_by_id(&mut self, id: CustomerId) -> Result<Option<Customer>, AppError>;

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, AppError>;

    async fn exists_by_id(&mut self, id: CustomerId) -> Result<bool, AppError>;

    /// Save a new customer, assigning its ID
    async fn insert(&mut self, customer: &NewCustomer) -> Result<Customer, AppError>;

    /// Save an existing customer in place; `None` when the row is gone
    async fn update(&mut self, customer: &Customer) -> Result<Option<Customer>, AppError>;

    /// Delete by ID; returns whether a row was removed
    async fn delete_by_id(&mut self, id: CustomerId) -> Result<bool, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// Short-lived connectivity check against the database
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Acquire a connection and validate it within `timeout`.
    ///
    /// `Ok(false)` means the connection was acquired but did not validate in time.
    async fn validate_connection(&self, timeout: Duration) -> Result<bool, AppError>;
}
