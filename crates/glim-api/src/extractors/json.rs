//! JSON body extractor with `{"message"}` rejections.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use glim_core::error::AppError;

use crate::error::ApiError;

/// Like [`axum::Json`], but a body that cannot be parsed becomes a 400
/// with the usual error shape.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(AppError::bad_request(rejection.body_text())))?;
        Ok(Self(value))
    }
}
