//! Customer API
//!
//! A REST service for creating, reading, updating and deleting customer
//! records stored in PostgreSQL.
//!
//! # Architecture Overview
//!
//! This crate is organized into four main layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │  HTTP handlers, routing, request validation  │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │   Customer use cases, health indicators      │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │   Traits, types, errors (no dependencies)    │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  PostgreSQL repository, logging, metrics     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Key Features
//!
//! - **Trait-based abstraction**: Persistence sits behind `CustomerRepository`
//! - **Transactions**: Every write runs in a transaction that rolls back on drop
//! - **Validation**: Request bodies are checked with the `validator` crate
//! - **Uniform errors**: Every failure renders the same JSON error body
//! - **Readiness**: Connection probes with a bounded timeout
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use customer_api::api::create_router;
//! use customer_api::app::AppState;
//! use customer_api::infra::PostgresClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
//!     db.run_migrations().await?;
//!
//!     let state = Arc::new(AppState::new(db.clone(), db));
//!
//!     let router = create_router(state);
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
