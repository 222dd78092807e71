use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::instrument;
use zeroize::{Zeroize, ZeroizeOnDrop};

const ENVELOPE_MAGIC: [u8; 3] = *b"LBX";
const ENVELOPE_VERSION: u8 = 1;
const ALG_XCHACHA20POLY1305: u8 = 1;
const XCHACHA_NONCE_LEN: usize = 24;
const HEADER_LEN: usize = 3 + 1 + 1;
const POLY1305_TAG_LEN: usize = 16;

/// Sealed bytes: `magic | version | algorithm | nonce | ciphertext+tag`.
/// The five header bytes are authenticated as associated data.
///
/// Personal vaults are sealed with XChaCha20-Poly1305 rather than AES-GCM.
/// Both are authenticated ciphers; the algorithm byte leaves room to add
/// AES-GCM without breaking existing blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub algorithm: u8,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    InvalidEnvelope,
    UnsupportedVersion(u8),
    UnsupportedAlgorithm(u8),
    EncryptionFailed,
    DecryptionFailed,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEnvelope => write!(f, "invalid encrypted envelope"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported envelope version: {version}")
            }
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm: {alg}"),
            Self::EncryptionFailed => write!(f, "encryption failed"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
        }
    }
}

impl std::error::Error for CryptoError {}

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(REDACTED)")
    }
}

impl Envelope {
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.nonce.len() + self.ciphertext.len());
        out.extend_from_slice(&header_bytes(self.algorithm));
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    #[instrument(level = "debug", skip(bytes), fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < HEADER_LEN {
            return Err(CryptoError::InvalidEnvelope);
        }
        if bytes[..3] != ENVELOPE_MAGIC {
            return Err(CryptoError::InvalidEnvelope);
        }
        let version = bytes[3];
        if version != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion(version));
        }
        let algorithm = bytes[4];
        if algorithm != ALG_XCHACHA20POLY1305 {
            return Err(CryptoError::UnsupportedAlgorithm(algorithm));
        }
        let body = &bytes[HEADER_LEN..];
        if body.len() < XCHACHA_NONCE_LEN + POLY1305_TAG_LEN {
            return Err(CryptoError::InvalidEnvelope);
        }
        let (nonce, ciphertext) = body.split_at(XCHACHA_NONCE_LEN);
        Ok(Self {
            algorithm,
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

#[instrument(
    level = "debug",
    skip(key, plaintext, aad),
    fields(plaintext_len = plaintext.len(), aad_len = aad.len())
)]
pub fn seal(key: &SecretKey, plaintext: &[u8], aad: &[u8]) -> Result<Envelope, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let payload_aad = payload_aad(ALG_XCHACHA20POLY1305, aad);
    let payload = Payload {
        msg: plaintext,
        aad: &payload_aad,
    };
    let ciphertext = cipher
        .encrypt(&nonce, payload)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(Envelope {
        algorithm: ALG_XCHACHA20POLY1305,
        nonce: nonce.to_vec(),
        ciphertext,
    })
}

#[instrument(
    level = "debug",
    skip(key, envelope, aad),
    fields(ciphertext_len = envelope.ciphertext.len(), aad_len = aad.len())
)]
pub fn open(key: &SecretKey, envelope: &Envelope, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if envelope.algorithm != ALG_XCHACHA20POLY1305 {
        return Err(CryptoError::UnsupportedAlgorithm(envelope.algorithm));
    }
    if envelope.nonce.len() != XCHACHA_NONCE_LEN {
        return Err(CryptoError::InvalidEnvelope);
    }
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = XNonce::from_slice(&envelope.nonce);
    let payload_aad = payload_aad(envelope.algorithm, aad);
    let payload = Payload {
        msg: &envelope.ciphertext,
        aad: &payload_aad,
    };
    cipher
        .decrypt(nonce, payload)
        .map_err(|_| CryptoError::DecryptionFailed)
}

fn header_bytes(algorithm: u8) -> [u8; HEADER_LEN] {
    [
        ENVELOPE_MAGIC[0],
        ENVELOPE_MAGIC[1],
        ENVELOPE_MAGIC[2],
        ENVELOPE_VERSION,
        algorithm,
    ]
}

fn payload_aad(algorithm: u8, aad: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + aad.len());
    out.extend_from_slice(&header_bytes(algorithm));
    out.extend_from_slice(aad);
    out
}
