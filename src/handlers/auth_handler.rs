use axum::
{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json}
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{error::AppError, state::AppState};
use crate::model::user::UserResponse;
use crate::services::{auth_service::{self, LoginPayload, RegisterPayload}, jwt::{self, Claims}, session::SESSION_COOKIE};

pub async fn register_handler(State(state): State<AppState>,
                              Json(payload): Json<RegisterPayload>) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let user = auth_service::register(&db, payload).await?;

    Ok((StatusCode::CREATED, Json(json!({ "user": UserResponse::from(&user) }))))
}

pub async fn login_handler(State(state): State<AppState>,
                           jar: CookieJar,
                           Json(payload): Json<LoginPayload>) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let user = auth_service::verify_credentials(&db, payload).await?;

    let user_id = user.id.map(|id| id.to_hex()).ok_or(AppError::InternalServerError)?;
    let token = jwt::generate_jwt(
        &state.config.jwt_secret,
        state.config.jwt_expiration_seconds,
        &user_id,
        &user.username,
        &user.name,
        &user.email,
        user.is_admin,
    )?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/") // Le cookie est valide pour tout le site
        .secure(state.config.cookie_secure) // Envoyé seulement sur HTTPS en production
        .http_only(true) // Inaccessible depuis JavaScript
        .same_site(SameSite::Lax) // Protection CSRF de base
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Authentication successful",
            "user": UserResponse::from(&user),
        })),
    ))
}

pub async fn logout_handler(jar: CookieJar) -> impl IntoResponse
{
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "message": "Logged out" })))
}

pub async fn get_current_user_handler(claims: Claims) -> impl IntoResponse
{
    Json
    (
        json!
        (
            {
                "user":
                {
                    "id": claims.sub,
                    "username": claims.username,
                    "name": claims.name,
                    "email": claims.email,
                    "isAdmin": claims.is_admin
                }
            }
        )
    )
}
