use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::crypto::{open, seal, CryptoError, Envelope, SecretKey};

const RECORD_AAD: &[u8] = b"lockbox:record:v1";

#[derive(Debug)]
pub enum CodecError {
    Serialize(serde_json::Error),
    Encrypt(CryptoError),
    /// Wrong key, malformed or truncated ciphertext, or a plaintext that is
    /// not the expected JSON.
    Decryption(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "serialize failed: {err}"),
            Self::Encrypt(err) => write!(f, "encrypt failed: {err}"),
            Self::Decryption(message) => write!(f, "decryption failed: {message}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Serializes `value` to JSON and seals it under `key`. Every call uses a
/// fresh nonce, so equal inputs produce different ciphertexts.
#[instrument(level = "debug", skip_all)]
pub fn encrypt_json<T: Serialize + ?Sized>(value: &T, key: &SecretKey) -> Result<String, CodecError> {
    let plaintext = serde_json::to_vec(value).map_err(CodecError::Serialize)?;
    let envelope = seal(key, &plaintext, RECORD_AAD).map_err(CodecError::Encrypt)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(envelope.to_bytes()))
}

#[instrument(level = "debug", skip_all, fields(ciphertext_len = ciphertext.len()))]
pub fn decrypt_json<T: DeserializeOwned>(ciphertext: &str, key: &SecretKey) -> Result<T, CodecError> {
    let plaintext = decrypt_text(ciphertext, key)?;
    serde_json::from_str(&plaintext).map_err(|err| CodecError::Decryption(err.to_string()))
}

pub fn decrypt_text(ciphertext: &str, key: &SecretKey) -> Result<String, CodecError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(ciphertext.trim())
        .map_err(|err| CodecError::Decryption(err.to_string()))?;
    let envelope = Envelope::from_bytes(&bytes).map_err(|err| CodecError::Decryption(err.to_string()))?;
    let plaintext =
        open(key, &envelope, RECORD_AAD).map_err(|err| CodecError::Decryption(err.to_string()))?;
    String::from_utf8(plaintext).map_err(|err| CodecError::Decryption(err.to_string()))
}
