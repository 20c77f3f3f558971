//! Application service layer.
//!
//! This module contains the customer use cases. Every mutating operation
//! runs inside one scoped transaction obtained from the repository; the
//! transaction is committed on success and rolled back when dropped on any
//! error path.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument, warn};

use crate::domain::{
    AppError, CreateCustomerRequest, CustomerDto, CustomerId, CustomerRepository, DatabaseError,
    NewCustomer, Page, PageRequest,
};

/// Message returned when an email is already taken.
pub const EMAIL_IN_USE: &str = "Email already in use";

fn not_found(id: CustomerId) -> AppError {
    AppError::NotFound(format!("Customer not found: {id}"))
}

/// Translates a unique-constraint violation raised by the database into
/// the same client error the pre-check produces.
fn email_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(DatabaseError::Duplicate(detail)) => {
            warn!(detail = %detail, "Email uniqueness enforced by schema constraint");
            AppError::BadRequest(EMAIL_IN_USE.to_string())
        }
        other => other,
    }
}

fn record_operation(operation: &'static str) {
    counter!("customer_operations_total", "operation" => operation).increment(1);
}

/// Application service containing the customer use cases.
///
/// Holds the repository behind its trait so tests can inject the
/// in-memory mock.
///
/// # Example
///
/// ```ignore
/// let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
/// let service = CustomerService::new(db);
///
/// let customer = service.create(&request).await?;
/// ```
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    /// Creates a new `CustomerService` instance.
    #[must_use]
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Returns every customer, unpaginated.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<CustomerDto>, AppError> {
        record_operation("find_all");
        let customers = self.repository.find_all().await?;
        Ok(customers.into_iter().map(CustomerDto::from).collect())
    }

    /// Returns one page of customers. A page past the end is empty.
    #[instrument(skip(self))]
    pub async fn find_page(&self, request: PageRequest) -> Result<Page<CustomerDto>, AppError> {
        record_operation("find_page");
        let page = self.repository.find_page(request).await?;
        Ok(page.map(CustomerDto::from))
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: CustomerId) -> Result<CustomerDto, AppError> {
        record_operation("find_by_id");
        self.repository
            .find_by_id(id)
            .await?
            .map(CustomerDto::from)
            .ok_or_else(|| not_found(id))
    }

    /// Creates a customer after checking that the email is unused.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when the email is taken, whether the
    /// pre-check or the table constraint detects it.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateCustomerRequest) -> Result<CustomerDto, AppError> {
        record_operation("create");
        let mut tx = self.repository.begin().await?;

        if tx.exists_by_email(&request.email).await? {
            warn!("Rejected customer with an email already in use");
            return Err(AppError::BadRequest(EMAIL_IN_USE.to_string()));
        }

        let saved = tx
            .insert(&NewCustomer::from(request))
            .await
            .map_err(email_conflict)?;
        tx.commit().await.map_err(email_conflict)?;

        info!(customer_id = saved.id, "Customer created");
        Ok(saved.into())
    }

    /// Overwrites name and email of an existing customer.
    ///
    /// The email is not re-checked against other rows here; a collision is
    /// only caught by the table constraint.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: CustomerId,
        request: &CreateCustomerRequest,
    ) -> Result<CustomerDto, AppError> {
        record_operation("update");
        let mut tx = self.repository.begin().await?;

        let existing = tx.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
        let saved = tx
            .update(&existing.with_changes(request))
            .await
            .map_err(email_conflict)?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(email_conflict)?;

        info!(customer_id = saved.id, "Customer updated");
        Ok(saved.into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), AppError> {
        record_operation("delete");
        let mut tx = self.repository.begin().await?;

        if !tx.exists_by_id(id).await? {
            return Err(not_found(id));
        }
        tx.delete_by_id(id).await?;
        tx.commit().await?;

        info!(customer_id = id, "Customer deleted");
        Ok(())
    }
}
