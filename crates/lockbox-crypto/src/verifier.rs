use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use crate::codec::{decrypt_text, encrypt_json, CodecError};
use crate::crypto::SecretKey;
use crate::kdf::{derive_key, KdfError, KdfParams};

/// Well-known plaintext sealed once at setup time.
pub const VERIFIER_PLAINTEXT: &str = "lockbox-master-password-verifier";

#[derive(Debug)]
pub enum UnlockError {
    Kdf(KdfError),
    InvalidPassword,
}

impl std::fmt::Display for UnlockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kdf(err) => write!(f, "{err}"),
            Self::InvalidPassword => write!(f, "invalid password"),
        }
    }
}

impl std::error::Error for UnlockError {}

pub fn create_verifier(key: &SecretKey) -> Result<String, CodecError> {
    encrypt_json(VERIFIER_PLAINTEXT, key)
}

/// True only when `verifier` opens under `key` to the well-known constant.
#[must_use]
pub fn verify_key(key: &SecretKey, verifier: &str) -> bool {
    let Ok(plaintext) = decrypt_text(verifier, key) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<String>(&plaintext) else {
        return false;
    };
    value.as_bytes().ct_eq(VERIFIER_PLAINTEXT.as_bytes()).into()
}

#[instrument(level = "debug", skip(password, salt, verifier))]
pub fn unlock(
    password: &str,
    salt: &str,
    verifier: &str,
    params: &KdfParams,
) -> Result<SecretKey, UnlockError> {
    let key = derive_key(password, salt, params).map_err(UnlockError::Kdf)?;
    if !verify_key(&key, verifier) {
        debug!(event = "unlock_rejected");
        return Err(UnlockError::InvalidPassword);
    }
    Ok(key)
}
