//! Axum extractor for validated request bodies
//!
//! `ValidatedJson<T>` deserializes the body into `T` and runs its
//! `validator::Validate` rules. Any failure is rejected with an
//! [`OrderError`] rendered as a 400 JSON response.

use crate::core::error::{OrderError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Axum extractor that deserializes and validates a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_order(
///     State(state): State<OrderAppState>,
///     ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
/// ) -> Result<(StatusCode, Json<Order>), OperationError> {
///     // payload has every required field and passes its rules
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    /// Get the inner payload
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = OrderError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            ValidationError::InvalidBody {
                message: rejection.body_text(),
            }
        })?;

        payload.validate().map_err(|errors| {
            tracing::debug!(error = %errors, "request body failed validation");
            OrderError::from(errors)
        })?;

        Ok(ValidatedJson(payload))
    }
}
