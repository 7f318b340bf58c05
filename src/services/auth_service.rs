use mongodb::bson::DateTime;
use mongodb::Database;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::model::{user::User, validation::Entity};
use crate::services::{user_service, validation_service};

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterPayload
{
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload
{
    pub username: String,
    pub password: String,
}

async fn hash_password(password: String) -> Result<String, AppError>
{
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|_| AppError::InternalServerError)?
        .map_err(|e|
        {
            error!("Password hashing failed: {}", e);
            AppError::InternalServerError
        })
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError>
{
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|_| AppError::InternalServerError)?
        .map_err(|e|
        {
            error!("Stored password hash is unreadable: {}", e);
            AppError::InternalServerError
        })
}

pub async fn register(db: &Database, payload: RegisterPayload) -> Result<User, AppError>
{
    validation_service::validate_payload(Entity::User, &payload)?;

    if !payload.email.contains('@')
    {
        return Err(AppError::Validation("user.email must be an email address.".to_string()));
    }

    let password = hash_password(payload.password).await?;

    let user = User
    {
        id: None,
        username: payload.username,
        name: payload.name,
        email: payload.email.to_lowercase(),
        password,
        is_admin: false,
        created_at: DateTime::now(),
    };

    let user = user_service::insert_user(db, user).await?;
    info!("User '{}' registered.", user.username);
    Ok(user)
}

pub async fn verify_credentials(db: &Database, payload: LoginPayload) -> Result<User, AppError>
{
    let rejected = || AppError::Unauthorized("Invalid username or password.".to_string());

    let Some(user) = user_service::get_user_by_username(db, &payload.username).await? else
    {
        warn!("Login attempt for unknown user '{}'", payload.username);
        return Err(rejected());
    };

    if !verify_password(payload.password, user.password.clone()).await?
    {
        warn!("Wrong password for user '{}'", user.username);
        return Err(rejected());
    }

    Ok(user)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[tokio::test]
    async fn hashed_password_verifies()
    {
        let hash = hash_password("correct horse".to_string()).await.unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("battery staple".to_string(), hash).await.unwrap());
    }

    #[test]
    fn register_payload_is_checked_against_user_rules()
    {
        let payload = RegisterPayload
        {
            username: "bob".to_string(),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(matches!(validation_service::validate_payload(Entity::User, &payload), Err(AppError::Validation(_))));
    }
}
