use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use tracing::{error, warn};

/// Code carried by requests whose body or query string could not be decoded.
pub const MALFORMED_REQUEST_CODE: u16 = 1003;

/// Handler failure rendered as `{"error": ..., "code": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// Extractor rejection; keeps axum's status (400, 415 or 422).
    Malformed { status: StatusCode, message: String },
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self { Self::Service(e) }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::Malformed { status: r.status(), message: r.body_text() }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        Self::Malformed { status: r.status(), message: r.body_text() }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Malformed { status, .. } => *status,
            ApiError::Service(e) => match e {
                ServiceError::Validation(_)
                | ServiceError::IndexOutOfBounds { .. }
                | ServiceError::InvalidRange { .. }
                | ServiceError::PageTooLarge { .. } => StatusCode::BAD_REQUEST,
                ServiceError::NotOwner(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::AlreadyCompleted(_) => StatusCode::CONFLICT,
                ServiceError::Storage(s) if s.is_capacity() => StatusCode::PAYLOAD_TOO_LARGE,
                ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ApiError::Service(e) => e.code(),
            ApiError::Malformed { .. } => MALFORMED_REQUEST_CODE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let msg = match self {
            ApiError::Service(e) => e.to_string(),
            ApiError::Malformed { message, .. } => {
                warn!(error = %message, "rejected malformed request");
                message
            }
        };
        if status.is_server_error() {
            error!(error = %msg, code, "storage failure");
        }
        (status, Json(serde_json::json!({"error": msg, "code": code}))).into_response()
    }
}
