use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidateEmail};

/// Identifier assigned by the database on first insert.
pub type CustomerId = i64;

/// Page size used when the request does not carry one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Persisted customer record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Overwrites the mutable fields from a request, keeping the identity.
    #[must_use]
    pub fn with_changes(mut self, changes: &CreateCustomerRequest) -> Self {
        self.name.clone_from(&changes.name);
        self.email.clone_from(&changes.email);
        self
    }
}

/// Customer that has not been saved yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
}

impl From<&CreateCustomerRequest> for NewCustomer {
    fn from(request: &CreateCustomerRequest) -> Self {
        Self {
            name: request.name.clone(),
            email: request.email.clone(),
        }
    }
}

/// Request payload for creating or replacing a customer.
///
/// Missing and `null` fields deserialize as empty strings so that they are
/// reported by the not-blank rule rather than as a decoding failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "size must be between 0 and 255")
    )]
    #[schema(example = "Ada Lovelace", max_length = 255)]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "well_formed_email"),
        length(max = 255, message = "size must be between 0 and 255")
    )]
    #[schema(example = "ada@example.com", max_length = 255)]
    pub email: String,
}

impl CreateCustomerRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn rule_violation(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_violation("not_blank", "must not be blank"));
    }
    Ok(())
}

// A blank address is reported as blank, not as malformed.
fn well_formed_email(value: &str) -> Result<(), validator::ValidationError> {
    not_blank(value)?;
    if value.validate_email() {
        return Ok(());
    }
    Err(rule_violation("email", "must be a well-formed email address"))
}

/// Read projection of a customer returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CustomerDto {
    #[schema(example = 1)]
    pub id: CustomerId,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
        }
    }
}

/// Query parameters accepted by the customer listing.
///
/// The paginated form is selected when either parameter is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Zero-based page number
    pub page: Option<u32>,
    /// Page size (1-100, default: 20)
    pub size: Option<u32>,
}

impl ListParams {
    /// Returns the page request when pagination was asked for.
    #[must_use]
    pub fn page_request(&self) -> Option<PageRequest> {
        if self.page.is_none() && self.size.is_none() {
            return None;
        }
        Some(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }
}

/// Zero-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the metadata needed to walk the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number_of_elements: u32,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let total_pages = u32::try_from(total_elements.div_ceil(u64::from(request.size)))
            .unwrap_or(u32::MAX);
        let number_of_elements = u32::try_from(content.len()).unwrap_or(u32::MAX);
        Self {
            empty: content.is_empty(),
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            number_of_elements,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }

    /// Converts the content while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}

/// Uniform error body returned for every handled failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub timestamp: DateTime<Utc>,
    #[schema(example = 404)]
    pub status: u16,
    #[schema(example = "Not Found")]
    pub error: String,
    #[schema(example = "Customer not found: 42")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            error: error.into(),
            message: message.into(),
            errors: None,
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Health check status for a component or the whole application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Outcome of a single health indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ComponentHealth {
    #[must_use]
    pub fn up() -> Self {
        Self {
            status: HealthStatus::Up,
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn down() -> Self {
        Self {
            status: HealthStatus::Down,
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Aggregated health of a group of indicators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub components: BTreeMap<String, ComponentHealth>,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn new(components: BTreeMap<String, ComponentHealth>) -> Self {
        let status = if components.values().all(ComponentHealth::is_up) {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };

        Self {
            status,
            components,
            timestamp: Utc::now(),
        }
    }
}
