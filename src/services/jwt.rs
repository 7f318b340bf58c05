use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, TokenData};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims
{
    /// Hex id of the user document.
    pub sub: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub exp: i64,
    pub is_admin: bool,
}

pub fn generate_jwt(secret: &str, jwt_expiration_seconds: u64, user_id: &str, username: &str, name: &str, email: &str, is_admin: bool) -> Result<String, AppError>
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims
    {
        sub: user_id.to_string(),
        username: username.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        exp: now + jwt_expiration_seconds as i64,
        is_admin,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|_| AppError::InternalServerError)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<Claims>, AppError>
{
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn issued_token_validates_with_same_secret_only()
    {
        let token = generate_jwt("s3cret", 60, "65f0c0ffee", "alice", "Alice", "alice@example.com", false).unwrap();

        let data = validate_jwt(&token, "s3cret").unwrap();
        assert_eq!(data.claims.sub, "65f0c0ffee");
        assert_eq!(data.claims.username, "alice");

        assert!(matches!(validate_jwt(&token, "other"), Err(AppError::Unauthorized(_))));
        assert!(validate_jwt("garbage", "s3cret").is_err());
    }
}
