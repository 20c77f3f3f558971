//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of domain traits
//! that can be configured to simulate various scenarios including
//! success, failure, and edge cases.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    AppError, ConnectionProbe, Customer, CustomerId, CustomerRepository, CustomerTransaction,
    DatabaseError, NewCustomer, Page, PageRequest,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.should_fail {
            let msg = self
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock database error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct MockStore {
    customers: BTreeMap<CustomerId, Customer>,
    last_id: CustomerId,
}

impl MockStore {
    fn email_taken(&self, email: &str, except: Option<CustomerId>) -> bool {
        self.customers
            .values()
            .any(|c| c.email == email && Some(c.id) != except)
    }

    fn duplicate(email: &str) -> AppError {
        AppError::Database(DatabaseError::Duplicate(format!(
            "duplicate key value violates unique constraint \"customer_email_key\": {email}"
        )))
    }
}

/// Mock customer repository for testing.
///
/// Keeps customers in an in-memory map, enforces email uniqueness the way
/// the table constraint does, and hands out transactions that only become
/// visible on commit.
///
/// # Example
///
/// ```ignore
/// use customer_api::test_utils::{MockCustomerRepository, mocks::MockConfig};
///
/// // Create a mock that succeeds
/// let mock = MockCustomerRepository::new();
///
/// // Create a mock that fails
/// let failing_mock = MockCustomerRepository::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockCustomerRepository {
    store: Arc<Mutex<MockStore>>,
    config: MockConfig,
    call_count: AtomicU64,
    is_healthy: AtomicBool,
    connection_valid: AtomicBool,
    stale_email_checks: AtomicBool,
}

impl MockCustomerRepository {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(MockStore::default())),
            config,
            call_count: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
            connection_valid: AtomicBool::new(true),
            stale_email_checks: AtomicBool::new(false),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Gets the number of times any method was called.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Makes the connection probe fail with an error.
    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Makes the connection probe report a connection that did not validate.
    pub fn set_connection_valid(&self, valid: bool) {
        self.connection_valid.store(valid, Ordering::Relaxed);
    }

    /// Makes `exists_by_email` always answer `false`, as if a concurrent
    /// insert had not been visible yet.
    pub fn set_stale_email_checks(&self, stale: bool) {
        self.stale_email_checks.store(stale, Ordering::Relaxed);
    }

    /// Inserts a customer directly, bypassing transactions.
    pub fn seed(&self, name: &str, email: &str) -> Customer {
        let mut store = self.store.lock().unwrap();
        store.last_id += 1;
        let customer = Customer::new(store.last_id, name, email);
        store.customers.insert(customer.id, customer.clone());
        customer
    }

    /// Gets all stored customers ordered by id.
    pub fn get_all_customers(&self) -> Vec<Customer> {
        self.store.lock().unwrap().customers.values().cloned().collect()
    }

    fn enter(&self) -> Result<(), AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.config.check()
    }
}

impl Default for MockCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for MockCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>, AppError> {
        self.enter()?;
        Ok(self.get_all_customers())
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Customer>, AppError> {
        self.enter()?;
        let store = self.store.lock().unwrap();
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content: Vec<Customer> = store
            .customers
            .values()
            .skip(offset)
            .take(request.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, request, store.customers.len() as u64))
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        self.enter()?;
        Ok(self.store.lock().unwrap().customers.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        self.enter()?;
        if self.stale_email_checks.load(Ordering::Relaxed) {
            return Ok(false);
        }
        Ok(self.store.lock().unwrap().email_taken(email, None))
    }

    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, AppError> {
        self.enter()?;
        Ok(self.store.lock().unwrap().customers.contains_key(&id))
    }

    async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, AppError> {
        self.enter()?;
        let staged = self.store.lock().unwrap().clone();
        Ok(Box::new(MockTransaction {
            store: Arc::clone(&self.store),
            staged,
            writes: Vec::new(),
            stale_email_checks: self.stale_email_checks.load(Ordering::Relaxed),
        }))
    }
}

#[async_trait]
impl ConnectionProbe for MockCustomerRepository {
    async fn validate_connection(&self, _timeout: Duration) -> Result<bool, AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }

        Ok(self.connection_valid.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    Upsert(Customer),
    Delete(CustomerId),
}

/// Transaction over a private view of the mock store.
///
/// Reads see the store as of `begin` plus this transaction's own writes.
/// Commit replays only those writes onto the shared store, re-checking
/// email uniqueness; dropping discards them. Ids come from the shared
/// sequence, so a rolled-back insert leaves a gap.
pub struct MockTransaction {
    store: Arc<Mutex<MockStore>>,
    staged: MockStore,
    writes: Vec<StagedWrite>,
    stale_email_checks: bool,
}

#[async_trait]
impl CustomerTransaction for MockTransaction {
    async fn find_by_id(&mut self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        Ok(self.staged.customers.get(&id).cloned())
    }

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, AppError> {
        if self.stale_email_checks {
            return Ok(false);
        }
        Ok(self.staged.email_taken(email, None))
    }

    async fn exists_by_id(&mut self, id: CustomerId) -> Result<bool, AppError> {
        Ok(self.staged.customers.contains_key(&id))
    }

    async fn insert(&mut self, customer: &NewCustomer) -> Result<Customer, AppError> {
        if self.staged.email_taken(&customer.email, None) {
            return Err(MockStore::duplicate(&customer.email));
        }
        let id = {
            let mut store = self.store.lock().unwrap();
            store.last_id += 1;
            store.last_id
        };
        let saved = Customer::new(id, &customer.name, &customer.email);
        self.staged.customers.insert(saved.id, saved.clone());
        self.writes.push(StagedWrite::Upsert(saved.clone()));
        Ok(saved)
    }

    async fn update(&mut self, customer: &Customer) -> Result<Option<Customer>, AppError> {
        if !self.staged.customers.contains_key(&customer.id) {
            return Ok(None);
        }
        if self.staged.email_taken(&customer.email, Some(customer.id)) {
            return Err(MockStore::duplicate(&customer.email));
        }
        self.staged.customers.insert(customer.id, customer.clone());
        self.writes.push(StagedWrite::Upsert(customer.clone()));
        Ok(Some(customer.clone()))
    }

    async fn delete_by_id(&mut self, id: CustomerId) -> Result<bool, AppError> {
        let removed = self.staged.customers.remove(&id).is_some();
        if removed {
            self.writes.push(StagedWrite::Delete(id));
        }
        Ok(removed)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MockTransaction { store, writes, .. } = *self;
        let mut shared = store.lock().unwrap();

        let mut next = shared.clone();
        for write in writes {
            match write {
                StagedWrite::Upsert(customer) => {
                    if next.email_taken(&customer.email, Some(customer.id)) {
                        return Err(MockStore::duplicate(&customer.email));
                    }
                    next.customers.insert(customer.id, customer);
                }
                StagedWrite::Delete(id) => {
                    next.customers.remove(&id);
                }
            }
        }

        *shared = next;
        Ok(())
    }
}
