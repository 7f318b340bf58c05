use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::AppError;

pub async fn health_check_handler() -> Result<impl IntoResponse, AppError>
{
    Ok((StatusCode::OK, "OK"))
}
