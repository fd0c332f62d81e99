// API error taxonomy — tagged failure kinds mapped to transport status codes.
//
// Handlers return ApiError instead of converting every failure into a
// generic 500; the mapping to HTTP happens exactly once, here. Internal
// errors are logged server-side and their message is carried in the JSON
// body as plain text, matching the rest of the wire format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::datasets::DatasetError;
use crate::model_status::ModeError;
use crate::training::TrainingError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request content (bad mode value, bad dataset, bad filename)
    #[error("{0}")]
    InvalidInput(String),
    /// Unknown scan id or dataset filename
    #[error("{0}")]
    NotFound(String),
    /// A singleton job is already running
    #[error("{0}")]
    Conflict(String),
    /// Server-side configuration is broken (expected state absent)
    #[error("{0}")]
    Config(String),
    /// Anything else — model, database, or filesystem failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Config(msg) => {
                tracing::error!(error = %msg, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ModeError> for ApiError {
    fn from(err: ModeError) -> Self {
        match err {
            ModeError::InvalidMode(_) => ApiError::InvalidInput(err.to_string()),
            ModeError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::InvalidName(_) => ApiError::InvalidInput(err.to_string()),
            DatasetError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DatasetError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::DatasetNotFound(_) => ApiError::NotFound(err.to_string()),
            TrainingError::InvalidDataset(_) => ApiError::InvalidInput(err.to_string()),
            TrainingError::MissingStatus => ApiError::Config(err.to_string()),
            TrainingError::Other(e) => ApiError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (
                ApiError::InvalidInput("bad".into()).into_response().status(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotFound("gone".into()).into_response().status(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("busy".into()).into_response().status(),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Config("broken".into()).into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("boom"))
                    .into_response()
                    .status(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (actual, expected) in cases {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_mode_error_maps_to_invalid_input() {
        let err: ApiError = ModeError::InvalidMode("turbo".into()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_dataset_not_found_maps_to_not_found() {
        let err: ApiError = DatasetError::NotFound("x.csv".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_missing_status_maps_to_config() {
        let err: ApiError = TrainingError::MissingStatus.into();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
