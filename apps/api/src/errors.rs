use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// The selected provider's credential is not configured.
    #[error("{0} not found in environment variables. Please set it in your .env file")]
    MissingCredential(&'static str),

    #[error("Failed to generate resume: {0}")]
    Generation(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential(_)
            | AppError::Generation(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            AppError::MissingCredential(env) => {
                tracing::error!("Generation requested but {env} is not set");
                ("CONFIGURATION_ERROR", self.to_string())
            }
            AppError::Generation(e) => {
                tracing::error!("LLM error: {e}");
                ("LLM_ERROR", self.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        // `error` stays a plain string: the web client reads it as the message.
        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
