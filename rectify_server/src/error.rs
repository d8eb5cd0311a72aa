use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use rectify_core::{logging::error, RectifyError};

/// Shown to callers for every failure. Details stay in the logs.
const GENERIC_FAILURE: &str = "Something went wrong";

/// Error body. `message` is generic; `kind` tells "could not verify" apart
/// from "bad request".
#[derive(Serialize)]
struct ErrorResponse {
    message: &'static str,
    kind: &'static str,
}

/// A rectification failure on its way out of a handler.
pub(crate) struct ApiError(pub(crate) RectifyError);

impl From<RectifyError> for ApiError {
    fn from(err: RectifyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("rectification failed: {}", self.0);
        let status = match self.0 {
            RectifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RectifyError::ProviderConnection(_) | RectifyError::ProviderAuth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            message: GENERIC_FAILURE,
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}
