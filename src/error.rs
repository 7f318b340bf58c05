use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn, info};

#[derive(Debug, Error)]
pub enum AppError
{
    #[error("Internal Server Error")]
    InternalServerError,

    #[error("document store unavailable: {0}")]
    Connection(String),

    #[error("document store error")]
    Database(#[from] mongodb::error::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("deployment platform error: {0}")]
    ExternalApi(String),

    #[error("stored token could not be decrypted")]
    Decryption,
}

#[derive(Debug, Error)]
pub enum ConfigError
{
    #[error("Missing environment variable: {0}")]
    Missing(String),

    #[error("Invalid environment variable: {0} (value: '{1}')")]
    Invalid(String, String),
}

impl AppError
{
    /// Whether the same request may succeed if issued again later.
    pub fn is_retryable(&self) -> bool
    {
        matches!(self, AppError::ExternalApi(_) | AppError::Connection(_))
    }

    pub fn status(&self) -> StatusCode
    {
        match self
        {
            AppError::InternalServerError | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) | AppError::Decryption => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn log(&self)
    {
        let status = self.status();
        match self
        {
            AppError::NotFound(ressource) => info!("--> RESSOURCE NON TROUVÉE (404): {}", ressource),
            _ if status.is_server_error() => error!("--> ERREUR SERVEUR ({}): {:?}", status.as_u16(), self),
            _ => warn!("--> REQUÊTE REFUSÉE ({}): {}", status.as_u16(), self),
        }
    }

    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String
    {
        match self
        {
            AppError::InternalServerError | AppError::Database(_) => "An internal error occurred".to_string(),
            AppError::Connection(_) => "The document store is unavailable".to_string(),
            AppError::Decryption => "The stored platform id could not be decrypted".to_string(),
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::Unauthorized(message)
            | AppError::BadRequest(message)
            | AppError::Conflict(message)
            | AppError::ExternalApi(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError
{
    fn into_response(self) -> Response
    {
        let status = self.status();
        self.log();

        let body = if self.is_retryable()
        {
            json!({ "error": self.public_message(), "retryable": true })
        }
        else
        {
            json!({ "error": self.public_message() })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[tokio::test]
    async fn external_errors_are_marked_retryable()
    {
        let response = AppError::ExternalApi("Not Authorized".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Not Authorized");
        assert_eq!(json["retryable"], true);
    }

    #[tokio::test]
    async fn decryption_error_has_no_redirect()
    {
        let response = AppError::Decryption.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(axum::http::header::LOCATION).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json.get("retryable").is_none());
    }
}
