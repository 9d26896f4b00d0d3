//! Error types for the application

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::kmeans::ClusterError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown control token: {0}")]
    UnknownToken(String),

    #[error("Game not started: {0}")]
    GameNotFound(String),

    #[error("Play is missing player: {0}")]
    MissingPlayer(&'static str),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Not enough colors in image: {0}")]
    InsufficientData(#[from] ClusterError),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidId(_) | AppError::MissingParameter(_) | AppError::UnknownToken(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::GameNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InsufficientData(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::ImageProcessing(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::MissingPlayer(_) | AppError::ExternalApi(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InvalidId("abc".into()), StatusCode::BAD_REQUEST),
            (AppError::UnknownToken("x".into()), StatusCode::BAD_REQUEST),
            (AppError::GameNotFound("1".into()), StatusCode::NOT_FOUND),
            (
                AppError::from(ClusterError::InsufficientData {
                    available: 2,
                    requested: 3,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::ExternalApi("down".into()), StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
