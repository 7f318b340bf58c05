use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, AeadCore},
    Aes256Gcm, Nonce, Key
};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::AppError;

const NONCE_SIZE: usize = 12; // 96 bits, standard pour AES-GCM

/// What a sealed token carries once opened.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPayload
{
    pub data: String,
}

pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, AppError>
{
    let key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher.encrypt(&nonce, plaintext)
        .map_err(|e|
        {
            tracing::error!("Encryption failed: {}", e);
            AppError::InternalServerError
        })?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(nonce.as_slice());
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

pub fn decrypt(ciphertext_with_nonce: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, AppError>
{
    if ciphertext_with_nonce.len() < NONCE_SIZE
    {
        tracing::warn!("Ciphertext is too short to contain a nonce.");
        return Err(AppError::Decryption);
    }

    let key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(key);

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext)
        .map_err(|e|
        {
            tracing::warn!("Decryption failed: {}. This might happen if the key is wrong or the data is corrupted.", e);
            AppError::Decryption
        })
}

/// Seals `data` into an opaque string safe to store in a document.
pub fn seal(data: &str, key: &[u8; 32]) -> Result<String, AppError>
{
    let payload = serde_json::to_vec(&TokenPayload { data: data.to_string() })
        .map_err(|_| AppError::InternalServerError)?;
    Ok(BASE64_STANDARD.encode(encrypt(&payload, key)?))
}

pub fn open(token: &str, key: &[u8; 32]) -> Result<TokenPayload, AppError>
{
    let raw = BASE64_STANDARD.decode(token.trim()).map_err(|_| AppError::Decryption)?;
    let plaintext = decrypt(&raw, key)?;
    serde_json::from_slice(&plaintext).map_err(|_| AppError::Decryption)
}

#[cfg(test)]
mod tests
{
    use super::*;

    const KEY: [u8; 32] = [42u8; 32];

    #[test]
    fn sealed_id_opens_with_the_same_key()
    {
        let sealed = seal("0f9a2c1e-railway-project", &KEY).unwrap();
        assert_ne!(sealed, "0f9a2c1e-railway-project");
        assert_eq!(open(&sealed, &KEY).unwrap().data, "0f9a2c1e-railway-project");
    }

    #[test]
    fn wrong_key_is_a_decryption_error()
    {
        let sealed = seal("abc", &KEY).unwrap();
        assert!(matches!(open(&sealed, &[1u8; 32]), Err(AppError::Decryption)));
    }

    #[test]
    fn tampered_token_is_a_decryption_error()
    {
        let sealed = seal("abc", &KEY).unwrap();
        let mut raw = BASE64_STANDARD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = BASE64_STANDARD.encode(raw);

        assert!(matches!(open(&tampered, &KEY), Err(AppError::Decryption)));
        assert!(matches!(open("not base64 at all!", &KEY), Err(AppError::Decryption)));
        assert!(matches!(open(&BASE64_STANDARD.encode([0u8; 4]), &KEY), Err(AppError::Decryption)));
    }
}
