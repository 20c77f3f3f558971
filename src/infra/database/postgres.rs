//! PostgreSQL database client implementation.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions};
use tracing::{debug, info, instrument};

use crate::domain::{
    AppError, ConnectionProbe, Customer, CustomerId, CustomerRepository, CustomerTransaction,
    DatabaseError, NewCustomer, Page, PageRequest,
};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn row_to_customer(row: &sqlx::postgres::PgRow) -> Result<Customer, AppError> {
        Ok(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }
}

#[async_trait]
impl CustomerRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query("SELECT id, name, email FROM customer ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    #[instrument(skip(self))]
    async fn find_page(&self, request: PageRequest) -> Result<Page<Customer>, AppError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM customer")
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, email
            FROM customer
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let content = rows
            .iter()
            .map(Self::row_to_customer)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(
            content,
            request,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query("SELECT id, name, email FROM customer WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    #[instrument(skip(self, email))]
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM customer WHERE email = $1) AS found")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }

    #[instrument(skip(self))]
    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1) AS found")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }

    async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        debug!("Transaction started");
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

#[async_trait]
impl ConnectionProbe for PostgresClient {
    #[instrument(skip(self))]
    async fn validate_connection(&self, timeout: Duration) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        match tokio::time::timeout(timeout, conn.ping()).await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(AppError::Database(DatabaseError::Connection(e.to_string()))),
            Err(_) => Ok(false),
        }
    }
}

/// Transaction-scoped customer operations.
///
/// Rolls back on drop unless committed.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CustomerTransaction for PostgresTransaction {
    async fn find_by_id(&mut self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query("SELECT id, name, email FROM customer WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(PostgresClient::row_to_customer).transpose()
    }

    async fn exists_by_email(&mut self, email: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM customer WHERE email = $1) AS found")
            .bind(email)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("found")?)
    }

    async fn exists_by_id(&mut self, id: CustomerId) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1) AS found")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("found")?)
    }

    async fn insert(&mut self, customer: &NewCustomer) -> Result<Customer, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customer (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .fetch_one(&mut *self.tx)
        .await?;

        PostgresClient::row_to_customer(&row)
    }

    async fn update(&mut self, customer: &Customer) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE customer
            SET name = $1,
                email = $2
            WHERE id = $3
            RETURNING id, name, email
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(PostgresClient::row_to_customer).transpose()
    }

    async fn delete_by_id(&mut self, id: CustomerId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }
}
