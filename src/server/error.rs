use crate::error::{ErrorKind, ProdifyError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Handler error rendered as `{ "success": false, "error": "<message>" }`.
#[derive(Debug)]
pub struct ApiError(pub ProdifyError);

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ProdifyError> for ApiError {
    fn from(e: ProdifyError) -> Self {
        Self(e)
    }
}

// Tell axum how to convert `ApiError` into a response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0.kind() {
            ErrorKind::Configuration | ErrorKind::UpstreamFetch | ErrorKind::Internal => {
                error!("Request failed ({}): {}", status, self.0)
            }
            _ => warn!("Request rejected ({}): {}", status, self.0),
        }
        let body = ErrorEnvelope {
            success: false,
            error: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
