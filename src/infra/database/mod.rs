//! Concrete database client implementations.
//!
//! This module contains the PostgreSQL adapter that implements the
//! `CustomerRepository` and `ConnectionProbe` traits from the domain layer.

pub mod postgres;

pub use postgres::{PostgresClient, PostgresConfig, PostgresTransaction};
