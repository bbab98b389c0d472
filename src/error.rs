use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP clients
#[derive(Error, Debug)]
pub enum AppError {
    #[error("ingredient_name is required")]
    MissingInput,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingInput => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs
        let message = match &self {
            AppError::MissingInput => self.to_string(),
            AppError::Internal(e) => {
                error!("Translation error: {:#}", e);
                "Translation failed".to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
