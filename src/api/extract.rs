//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::domain::AppError;

/// JSON body that has passed its `validator` rules.
///
/// Decoding and validation both happen before the handler runs, so a bad
/// body never reaches the service layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!(error = %rejection.body_text(), "Rejected unreadable request body");
            match rejection {
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::UnsupportedMediaType(rejection.body_text())
                }
                _ => AppError::BadRequest(format!(
                    "Malformed request body: {}",
                    rejection.body_text()
                )),
            }
        })?;

        value.validate().inspect_err(|e| {
            debug!(error = %e, "Request validation failed");
        })?;

        Ok(Self(value))
    }
}
