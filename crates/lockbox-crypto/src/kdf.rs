use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::instrument;

use crate::crypto::SecretKey;

pub const KDF_PBKDF2_SHA256: &str = "pbkdf2-sha256";
pub const KDF_ARGON2ID: &str = "argon2id";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;
/// Floor for PBKDF2 parameters used to protect a new verifier.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub algorithm: String,
    pub iterations: u32,
    #[serde(default)]
    pub memory_kb: u32,
    #[serde(default)]
    pub parallelism: u32,
}

impl KdfParams {
    #[must_use]
    pub fn pbkdf2(iterations: u32) -> Self {
        Self {
            algorithm: KDF_PBKDF2_SHA256.to_string(),
            iterations,
            memory_kb: 0,
            parallelism: 0,
        }
    }

    #[must_use]
    pub fn argon2id(iterations: u32, memory_kb: u32, parallelism: u32) -> Self {
        Self {
            algorithm: KDF_ARGON2ID.to_string(),
            iterations,
            memory_kb,
            parallelism,
        }
    }

    /// Rejects parameters too weak to protect freshly created unlock
    /// material. `derive_key` itself accepts them so stored material made with
    /// older parameters can still be opened.
    pub fn ensure_setup_strength(&self) -> Result<(), KdfError> {
        if self.algorithm == KDF_PBKDF2_SHA256 && self.iterations < MIN_PBKDF2_ITERATIONS {
            return Err(KdfError::InvalidParams(format!(
                "pbkdf2 needs at least {MIN_PBKDF2_ITERATIONS} iterations, got {}",
                self.iterations
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::pbkdf2(DEFAULT_PBKDF2_ITERATIONS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfError {
    UnsupportedAlgorithm(String),
    InvalidParams(String),
    EmptySalt,
    DerivationFailed(String),
}

impl std::fmt::Display for KdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported kdf algorithm: {alg}"),
            Self::InvalidParams(message) => write!(f, "invalid kdf params: {message}"),
            Self::EmptySalt => write!(f, "kdf salt is empty"),
            Self::DerivationFailed(message) => write!(f, "key derivation failed: {message}"),
        }
    }
}

impl std::error::Error for KdfError {}

/// Derives the 256-bit master key. Identical `(password, salt, params)` always
/// yield identical key material.
#[instrument(level = "debug", skip(password, salt), fields(algorithm = %params.algorithm, iterations = params.iterations))]
pub fn derive_key(password: &str, salt: &str, params: &KdfParams) -> Result<SecretKey, KdfError> {
    if salt.is_empty() {
        return Err(KdfError::EmptySalt);
    }
    if params.iterations == 0 {
        return Err(KdfError::InvalidParams("iterations must be positive".to_string()));
    }
    let mut key = [0u8; 32];
    match params.algorithm.as_str() {
        KDF_PBKDF2_SHA256 => {
            pbkdf2::pbkdf2_hmac::<Sha256>(
                password.as_bytes(),
                salt.as_bytes(),
                params.iterations,
                &mut key,
            );
        }
        KDF_ARGON2ID => {
            let argon_params = Params::new(
                params.memory_kb,
                params.iterations,
                params.parallelism,
                Some(32),
            )
            .map_err(|err| KdfError::InvalidParams(err.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key)
                .map_err(|err| KdfError::DerivationFailed(err.to_string()))?;
        }
        other => return Err(KdfError::UnsupportedAlgorithm(other.to_string())),
    }
    Ok(SecretKey::from_bytes(key))
}

#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pbkdf2_is_deterministic() {
        let params = KdfParams::pbkdf2(1_000);
        let first = derive_key("hunter2", "salt", &params).expect("derive");
        let second = derive_key("hunter2", "salt", &params).expect("derive");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn default_params_are_deterministic() {
        let params = KdfParams::default();
        assert_eq!(params.iterations, DEFAULT_PBKDF2_ITERATIONS);
        let first = derive_key("correct horse", "c2FsdA==", &params).expect("derive");
        let second = derive_key("correct horse", "c2FsdA==", &params).expect("derive");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn salt_and_password_change_the_key() {
        let params = KdfParams::pbkdf2(1_000);
        let base = derive_key("hunter2", "salt-a", &params).expect("derive");
        let other_salt = derive_key("hunter2", "salt-b", &params).expect("derive");
        let other_password = derive_key("hunter3", "salt-a", &params).expect("derive");
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_password.as_bytes());
    }

    #[test]
    fn argon2id_is_supported() {
        let params = KdfParams::argon2id(1, 1024, 1);
        let first = derive_key("hunter2", "saltsaltsalt", &params).expect("derive");
        let second = derive_key("hunter2", "saltsaltsalt", &params).expect("derive");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn rejects_unknown_algorithm_and_bad_input() {
        let mut params = KdfParams::pbkdf2(1_000);
        params.algorithm = "md5".to_string();
        assert!(matches!(
            derive_key("pw", "salt", &params),
            Err(KdfError::UnsupportedAlgorithm(alg)) if alg == "md5"
        ));
        assert!(matches!(
            derive_key("pw", "", &KdfParams::pbkdf2(1_000)),
            Err(KdfError::EmptySalt)
        ));
        assert!(matches!(
            derive_key("pw", "salt", &KdfParams::pbkdf2(0)),
            Err(KdfError::InvalidParams(_))
        ));
    }

    #[test]
    fn setup_strength_requires_the_pbkdf2_floor() {
        assert!(matches!(
            KdfParams::pbkdf2(1).ensure_setup_strength(),
            Err(KdfError::InvalidParams(_))
        ));
        assert!(KdfParams::pbkdf2(MIN_PBKDF2_ITERATIONS - 1)
            .ensure_setup_strength()
            .is_err());
        assert!(KdfParams::default().ensure_setup_strength().is_ok());
        assert!(KdfParams::argon2id(3, 65_536, 1)
            .ensure_setup_strength()
            .is_ok());
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
