use std::time::Duration;
use axum::
{
    extract::{Request, State, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::
{
    error::AppError,
    handlers::page_handler,
    services::{jwt::{self, Claims}, render_service, session::{self, GateOutcome, SESSION_COOKIE}},
    state::AppState,
};

/// API routes: no valid session, no access.
pub async fn auth(State(state): State<AppState>, jar: CookieJar, mut req: Request, next: Next) -> Result<Response, AppError>
{
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value())
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token.".to_string()))?;

    let token_data = jwt::validate_jwt(token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

/// Page routes: the session is restored before anything else runs.
pub async fn session_gate(State(state): State<AppState>, jar: CookieJar, mut req: Request, next: Next) -> Response
{
    let budget = Duration::from_millis(state.config.session_restore_timeout_ms);
    let session = match session::restore_within(&state, &jar, budget).await
    {
        Ok(session) => session,
        Err(e) => return page_handler::html_error(e),
    };

    match session::gate(session)
    {
        GateOutcome::Pending =>
        {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, "1")],
                Html(render_service::loading_page()),
            ).into_response()
        }
        GateOutcome::Redirect(to) => Redirect::to(to).into_response(),
        GateOutcome::Render(claims) =>
        {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
    }
}

impl<S> FromRequestParts<S> for Claims where S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection>
    {
        parts.extensions.get::<Claims>().cloned().ok_or_else(||
        {
            tracing::error!("The Claims extractor was used on a route without an authentication middleware.");
            AppError::InternalServerError
        })
    }
}
