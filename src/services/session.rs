use std::time::Duration;
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::{error::AppError, services::{jwt::{self, Claims}, user_service}, state::AppState};

pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Debug, Clone)]
pub enum SessionState
{
    /// Restore has not answered yet.
    Loading,
    Unauthenticated,
    Authenticated(Claims),
}

#[derive(Debug)]
pub enum GateOutcome
{
    Pending,
    Redirect(&'static str),
    Render(Claims),
}

pub fn gate(session: SessionState) -> GateOutcome
{
    match session
    {
        SessionState::Loading => GateOutcome::Pending,
        SessionState::Unauthenticated => GateOutcome::Redirect("/"),
        SessionState::Authenticated(claims) => GateOutcome::Render(claims),
    }
}

/// Cookie → token → user still on record. No cookie means no store access.
pub async fn restore_session(state: &AppState, jar: &CookieJar) -> Result<SessionState, AppError>
{
    let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) else
    {
        return Ok(SessionState::Unauthenticated);
    };

    let claims = match jwt::validate_jwt(&token, &state.config.jwt_secret)
    {
        Ok(data) => data.claims,
        Err(_) =>
        {
            debug!("Session cookie rejected.");
            return Ok(SessionState::Unauthenticated);
        }
    };

    let db = state.db().await?;
    match user_service::get_user_by_id(&db, &claims.sub).await?
    {
        Some(_) => Ok(SessionState::Authenticated(claims)),
        None =>
        {
            warn!("Session for user '{}' refers to a deleted account.", claims.username);
            Ok(SessionState::Unauthenticated)
        }
    }
}

/// Same as `restore_session`, but a restore that outlives `budget` stays `Loading`.
pub async fn restore_within(state: &AppState, jar: &CookieJar, budget: Duration) -> Result<SessionState, AppError>
{
    match tokio::time::timeout(budget, restore_session(state, jar)).await
    {
        Ok(result) => result,
        Err(_) =>
        {
            warn!("Session restore did not finish within {:?}.", budget);
            Ok(SessionState::Loading)
        }
    }
}
