use axum::
{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::
{
    error::AppError,
    services::{dashboard_service, jwt::Claims, render_service},
    state::AppState,
};

/// Page routes answer errors in HTML, with the status the API would use.
pub fn html_error(e: AppError) -> Response
{
    e.log();
    let status = e.status();
    (status, Html(render_service::error_page(status.as_u16(), &e.public_message()))).into_response()
}

pub async fn landing_handler() -> impl IntoResponse
{
    Html(render_service::landing_page())
}

pub async fn project_page_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path(project_id): Path<String>,
) -> Response
{
    match dashboard_service::load_dashboard(&state, &claims, &project_id).await
    {
        Ok(view) => Html(render_service::dashboard_page(&view)).into_response(),
        Err(e) => html_error(e),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use axum::http::{header, StatusCode};

    async fn body_text(response: Response) -> String
    {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&body).into_owned()
    }

    #[tokio::test]
    async fn missing_project_renders_an_html_404()
    {
        let response = html_error(AppError::NotFound("Project with id abc not found.".to_string()));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(body_text(response).await.contains("Project with id abc not found."));
    }

    #[tokio::test]
    async fn store_outage_renders_an_html_503()
    {
        let response = html_error(AppError::Connection("connection refused".to_string()));

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_text(response).await;
        assert!(body.contains("The document store is unavailable"));
        assert!(!body.contains("connection refused"));
    }
}
