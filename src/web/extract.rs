//! Request extractors.
//!
//! axum's stock `Json` rejection is plain text, which would be the one place
//! a caller gets a non-JSON error body. This wrapper funnels body rejections
//! through [`ApiError`] so malformed payloads come back as 400 with the same
//! `{error, timestamp}` shape as every other failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::PrintgateError;
use crate::web::errors::ApiError;

/// JSON body extractor with a structured rejection
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(map_rejection(rejection))),
        }
    }
}

fn map_rejection(rejection: JsonRejection) -> PrintgateError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            PrintgateError::validation(format!("invalid request body: {e}"))
        }
        JsonRejection::JsonSyntaxError(_) => {
            PrintgateError::validation("request body is not valid JSON")
        }
        JsonRejection::MissingJsonContentType(_) => {
            PrintgateError::validation("expected content-type: application/json")
        }
        other => PrintgateError::validation(format!("unreadable request body: {other}")),
    }
}
