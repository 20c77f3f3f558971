//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    ApiError, AppError, ComponentHealth, CreateCustomerRequest, CustomerDto, CustomerId,
    DatabaseError, HealthResponse, HealthStatus, ListParams, Page,
};

use super::extract::ValidatedJson;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Customer API",
        version = "0.1.0",
        description = "CRUD API for customer records backed by PostgreSQL",
        license(
            name = "MIT"
        )
    ),
    paths(
        list_customers_handler,
        get_customer_handler,
        create_customer_handler,
        update_customer_handler,
        delete_customer_handler,
        health_handler,
        component_health_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            CustomerDto,
            CreateCustomerRequest,
            Page<CustomerDto>,
            ApiError,
            HealthResponse,
            ComponentHealth,
            HealthStatus,
        )
    ),
    tags(
        (name = "customers", description = "Customer management endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// List customers, paginated when `page` or `size` is given
#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    params(ListParams),
    responses(
        (status = 200, description = "All customers, or one Page<CustomerDto> when paginated", body = Vec<CustomerDto>),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_customers_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let response = match params.page_request() {
        Some(request) => {
            let page: Page<CustomerDto> = state.service.find_page(request).await?;
            Json(page).into_response()
        }
        None => Json(state.service.find_all().await?).into_response(),
    };
    Ok(response)
}

/// Get a single customer by ID
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i64, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer found", body = CustomerDto),
        (status = 404, description = "Customer not found", body = ApiError)
    )
)]
pub async fn get_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerDto>, AppError> {
    Ok(Json(state.service.find_by_id(id).await?))
}

/// Create a new customer
#[utoipa::path(
    post,
    path = "/customers",
    tag = "customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerDto),
        (status = 400, description = "Validation failed or email already in use", body = ApiError),
        (status = 415, description = "Body is not declared as application/json", body = ApiError)
    )
)]
pub async fn create_customer_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerDto>), AppError> {
    let customer = state.service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Replace the name and email of a customer
#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i64, Path, description = "Customer ID")
    ),
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Customer not found", body = ApiError),
        (status = 415, description = "Body is not declared as application/json", body = ApiError)
    )
)]
pub async fn update_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CustomerId>,
    ValidatedJson(payload): ValidatedJson<CreateCustomerRequest>,
) -> Result<Json<CustomerDto>, AppError> {
    Ok(Json(state.service.update(id, &payload).await?))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i64, Path, description = "Customer ID")
    ),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = ApiError)
    )
)]
pub async fn delete_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode, AppError> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn health_status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Aggregated health of every indicator
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "All components are up", body = HealthResponse),
        (status = 503, description = "At least one component is down", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.check_all().await;
    (
        health_status_code(health.status),
        [(header::CACHE_CONTROL, "no-store")],
        Json(health),
    )
}

/// Health of a single named indicator
#[utoipa::path(
    get,
    path = "/health/{component}",
    tag = "health",
    params(
        ("component" = String, Path, description = "Indicator name, e.g. `db` or `databaseReadiness`")
    ),
    responses(
        (status = 200, description = "Component is up", body = ComponentHealth),
        (status = 404, description = "Unknown component", body = ApiError),
        (status = 503, description = "Component is down", body = ComponentHealth)
    )
)]
pub async fn component_health_handler(
    State(state): State<Arc<AppState>>,
    Path(component): Path<String>,
) -> Result<Response, AppError> {
    let health = state
        .health
        .check_component(&component)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Health component not found: {component}")))?;
    Ok((
        health_status_code(health.status),
        [(header::CACHE_CONTROL, "no-store")],
        Json(health),
    )
        .into_response())
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, [(header::CACHE_CONTROL, "no-store")])
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic", body = HealthResponse),
        (status = 503, description = "Application is not ready", body = HealthResponse)
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.check_readiness().await;
    (
        health_status_code(health.status),
        [(header::CACHE_CONTROL, "no-store")],
        Json(health),
    )
}

/// Prometheus scrape endpoint
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, category, message, errors) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad Request", msg.clone(), None)
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Media Type",
                msg.clone(),
                None,
            ),
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "Validation Failed",
                "Invalid request".to_string(),
                Some(err.field_errors().to_vec()),
            ),
            AppError::Database(DatabaseError::Connection(_) | DatabaseError::PoolExhausted(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "Database unavailable".to_string(),
                None,
            ),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Unexpected error".to_string(),
                None,
            ),
        };

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Server error");
        }

        let mut body = ApiError::new(status.as_u16(), category, message);
        if let Some(errors) = errors {
            body = body.with_errors(errors);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;
    use crate::domain::ValidationError;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_translation() {
        let (status, body) = body_of(AppError::NotFound("Customer not found: 3".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Customer not found: 3");
        assert!(body.get("errors").is_none());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_bad_request_translation() {
        let (status, body) = body_of(AppError::BadRequest("Email already in use".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_media_type_translation() {
        let (status, body) =
            body_of(AppError::UnsupportedMediaType("Expected application/json".to_string())).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["status"], 415);
        assert_eq!(body["error"], "Unsupported Media Type");
    }

    #[tokio::test]
    async fn test_validation_translation() {
        let err = AppError::Validation(ValidationError::Fields(vec![
            "name: must not be blank".to_string(),
        ]));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation Failed");
        assert_eq!(body["message"], "Invalid request");
        assert_eq!(body["errors"][0], "name: must not be blank");
    }

    #[tokio::test]
    async fn test_database_errors_hide_details() {
        let (status, body) =
            body_of(AppError::Database(DatabaseError::Query("secret sql".to_string()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Unexpected error");

        let (status, _) =
            body_of(AppError::Database(DatabaseError::Connection("refused".to_string()))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
