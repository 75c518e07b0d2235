use crate::core::GridError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            ServerError::Grid(GridError::Decode(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg,
                "input_error".to_string(),
            ),
            ServerError::Grid(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "internal_error".to_string(),
            ),
            ServerError::Input(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg,
                "input_error".to_string(),
            ),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found".to_string()),
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_map_to_unprocessable() {
        let response = ServerError::from(GridError::Decode("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn grid_errors_convert_and_display_transparently() {
        let err: ServerError = GridError::RowOutOfRange(3).into();
        assert_eq!(err.to_string(), "Row 3 is out of range");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Input("body".to_string()).to_string(),
            "Invalid input: body"
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ServerError::NotFound("record 3 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
