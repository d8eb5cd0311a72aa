use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    routing::post,
    Json, Router,
};

use rectify_core::{logging::debug, AuthMode, RectificationReport, RectifyError, RectifyRequest};

use crate::{error::ApiError, AppState};

/// Return a router to handle all rectification requests
pub(super) fn router() -> Router {
    Router::new()
        .route("/api/node/rectify", post(auto_handler))
        .route("/api/node/iam/rectify", post(credential_handler))
        .route("/api/node/x509/rectify", post(certificate_handler))
}

/// Rectify with username/password authentication.
async fn credential_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Result<Json<RectifyRequest>, JsonRejection>,
) -> Result<Json<RectificationReport>, ApiError> {
    rectify(&state, parse_body(request)?, AuthMode::Credential).await
}

/// Rectify with X.509 certificate authentication.
async fn certificate_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Result<Json<RectifyRequest>, JsonRejection>,
) -> Result<Json<RectificationReport>, ApiError> {
    rectify(&state, parse_body(request)?, AuthMode::Certificate).await
}

/// Rectify with whichever mode the populated fields and config defaults
/// call for. Certificate material wins over credentials.
async fn auto_handler(
    Extension(state): Extension<Arc<AppState>>,
    request: Result<Json<RectifyRequest>, JsonRejection>,
) -> Result<Json<RectificationReport>, ApiError> {
    let request = parse_body(request)?;
    let mode = request.auth_mode(&state.config);
    rectify(&state, request, mode).await
}

/// Bodies axum can't read are reported like any other bad input.
fn parse_body(
    request: Result<Json<RectifyRequest>, JsonRejection>,
) -> Result<RectifyRequest, ApiError> {
    match request {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => Err(RectifyError::InvalidInput(rejection.to_string()).into()),
    }
}

async fn rectify(
    state: &AppState,
    request: RectifyRequest,
    mode: AuthMode,
) -> Result<Json<RectificationReport>, ApiError> {
    debug!("{} rectification requested: {:?}", mode, request);
    let target = request.into_target(mode, &state.config)?;
    let result = state
        .rectifier
        .rectify(request.required_permissions(), &target)
        .await?;
    Ok(Json(result.report()))
}
