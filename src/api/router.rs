//! HTTP routing configuration with OpenAPI documentation.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::handlers::{
    ApiDoc, component_health_handler, create_customer_handler, delete_customer_handler,
    get_customer_handler, health_handler, list_customers_handler, liveness_handler,
    metrics_handler, readiness_handler, update_customer_handler,
};

/// Time allowed for a request before it is answered with 408.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the router with the default request timeout
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_router_with_timeout(app_state, DEFAULT_REQUEST_TIMEOUT)
}

/// Create the router with a custom request timeout
pub fn create_router_with_timeout(app_state: Arc<AppState>, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let customer_routes = Router::new()
        .route("/", get(list_customers_handler).post(create_customer_handler))
        .route(
            "/{id}",
            get(get_customer_handler)
                .put(update_customer_handler)
                .delete(delete_customer_handler),
        );

    let health_routes = Router::new()
        .route("/", get(health_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .route("/{component}", get(component_health_handler));

    Router::new()
        .nest("/customers", customer_routes)
        .nest("/health", health_routes)
        .route("/metrics", get(metrics_handler))
        .layer(middleware)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::MockCustomerRepository;

    fn test_router() -> (Arc<MockCustomerRepository>, Router) {
        let repo = Arc::new(MockCustomerRepository::new());
        let state = Arc::new(AppState::new(repo.clone(), repo.clone()));
        (repo, create_router(state))
    }

    #[tokio::test]
    async fn test_customers_route_is_mounted() {
        let (repo, router) = test_router();
        repo.seed("Ada", "ada@example.com");

        let response = router
            .oneshot(Request::builder().uri("/customers").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (_, router) = test_router();

        let response = router
            .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let (_, router) = test_router();

        let response = router
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/customers/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (repo, router) = test_router();
        let name = "a".repeat(MAX_BODY_BYTES + 1);
        let body = format!(r#"{{"name":"{name}","email":"big@example.com"}}"#);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/customers")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(repo.get_all_customers().is_empty());
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (_, router) = test_router();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/customers/{id}"].is_object());
    }
}
