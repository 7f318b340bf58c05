use base64::prelude::*;
use crate::error::ConfigError;

pub const KEY_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct Config
{
    pub host: String,
    pub port: u16,
    pub mongo_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    pub cookie_secure: bool,
    pub token_key: [u8; KEY_SIZE],
    pub railway_api_url: String,
    pub railway_api_token: String,
    pub railway_console_url: String,
    pub poll_interval_ms: u64,
    pub poll_max_backoff_ms: u64,
    pub session_restore_timeout_ms: u64,
    pub timeout_normal: u64,
}

fn required(name: &str) -> Result<String, ConfigError>
{
    std::env::var(name).map_err(|_| ConfigError::Missing(name.to_string()))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
{
    match std::env::var(name)
    {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

pub fn decode_token_key(raw: &str) -> Result<[u8; KEY_SIZE], ConfigError>
{
    let bytes = BASE64_STANDARD.decode(raw.trim())
        .map_err(|_| ConfigError::Invalid("BW_SECRET_KEY".to_string(), "<not base64>".to_string()))?;

    bytes.try_into().map_err(|b: Vec<u8>|
    {
        ConfigError::Invalid("BW_SECRET_KEY".to_string(), format!("<{} bytes, expected {}>", b.len(), KEY_SIZE))
    })
}

impl Config
{
    pub fn from_env() -> Result<Self, ConfigError>
    {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("APP_PORT", 3000u16)?;

        let mongo_url = required("MONGO_URL")?;

        let jwt_secret = required("APP_JWT_SECRET")?;
        let jwt_expiration_seconds = parsed_or("JWT_EXPIRATION_SECONDS", 3600u64)?;
        let cookie_secure = parsed_or("COOKIE_SECURE", true)?;

        // Jamais journalisée, même en cas d'erreur.
        let token_key = decode_token_key(&required("BW_SECRET_KEY")?)?;

        let railway_api_url = std::env::var("RAILWAY_API_URL")
            .unwrap_or_else(|_| "https://backboard.railway.app/graphql/v2".to_string());
        let railway_api_token = required("RAILWAY_API_TOKEN")?;
        let railway_console_url = std::env::var("RAILWAY_CONSOLE_URL")
            .unwrap_or_else(|_| "https://railway.app".to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_interval_ms = parsed_or("POLL_INTERVAL_MS", 1000u64)?;
        let poll_max_backoff_ms = parsed_or("POLL_MAX_BACKOFF_MS", 30_000u64)?;
        if poll_interval_ms == 0
        {
            return Err(ConfigError::Invalid("POLL_INTERVAL_MS".to_string(), "0".to_string()));
        }

        let session_restore_timeout_ms = parsed_or("SESSION_RESTORE_TIMEOUT_MS", 5000u64)?;
        let timeout_normal = parsed_or("TIMEOUT_NORMAL", 30u64)?;

        Ok(Config
        {
            host,
            port,
            mongo_url,
            jwt_secret,
            jwt_expiration_seconds,
            cookie_secure,
            token_key,
            railway_api_url,
            railway_api_token,
            railway_console_url,
            poll_interval_ms,
            poll_max_backoff_ms,
            session_restore_timeout_ms,
            timeout_normal,
        })
    }
}

#[cfg(test)]
impl Config
{
    pub fn for_tests() -> Self
    {
        Config
        {
            host: "127.0.0.1".to_string(),
            port: 0,
            mongo_url: "mongodb://127.0.0.1:1/botway_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_seconds: 3600,
            cookie_secure: false,
            token_key: [7u8; KEY_SIZE],
            railway_api_url: "http://127.0.0.1:1/graphql/v2".to_string(),
            railway_api_token: "railway-test-token".to_string(),
            railway_console_url: "https://railway.app".to_string(),
            poll_interval_ms: 1000,
            poll_max_backoff_ms: 30_000,
            session_restore_timeout_ms: 5000,
            timeout_normal: 30,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn token_key_must_be_32_bytes()
    {
        let good = BASE64_STANDARD.encode([1u8; KEY_SIZE]);
        assert_eq!(decode_token_key(&good).unwrap(), [1u8; KEY_SIZE]);

        let short = BASE64_STANDARD.encode([1u8; 16]);
        assert!(matches!(decode_token_key(&short), Err(ConfigError::Invalid(name, _)) if name == "BW_SECRET_KEY"));

        assert!(decode_token_key("%%%").is_err());
    }
}
