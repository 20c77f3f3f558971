//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, DatabaseError, ValidationError};
pub use traits::{ConnectionProbe, CustomerRepository, CustomerTransaction};
pub use types::{
    ApiError, ComponentHealth, CreateCustomerRequest, Customer, CustomerDto, CustomerId,
    DEFAULT_PAGE_SIZE, HealthResponse, HealthStatus, ListParams, MAX_PAGE_SIZE, NewCustomer, Page,
    PageRequest,
};
