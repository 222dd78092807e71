use data_encoding::{Encoding, Specification};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_STEP_SECONDS: u64 = 30;
const MAX_DIGITS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OtpAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl OtpAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Length of the all-zero key used when a secret cannot be decoded.
    #[must_use]
    pub const fn zero_key_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Accepts `SHA1`, `sha-256`, `HmacSHA512` and similar spellings.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        match normalized.trim_start_matches("HMAC") {
            "SHA1" => Some(Self::Sha1),
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpOptions {
    pub digits: u32,
    pub algorithm: OtpAlgorithm,
    pub step_seconds: u64,
    pub now_millis: u64,
}

impl TotpOptions {
    #[must_use]
    pub const fn at(now_millis: u64) -> Self {
        Self {
            digits: DEFAULT_DIGITS,
            algorithm: OtpAlgorithm::Sha1,
            step_seconds: DEFAULT_STEP_SECONDS,
            now_millis,
        }
    }
}

fn base32_lenient() -> Encoding {
    let mut spec = Specification::new();
    spec.symbols.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");
    spec.translate.from.push_str("abcdefghijklmnopqrstuvwxyz");
    spec.translate.to.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    spec.check_trailing_bits = false;
    // Specification only fails on an inconsistent alphabet, which this is not.
    spec.encoding().unwrap_or_else(|_| data_encoding::BASE32_NOPAD.clone())
}

/// Decodes a base32 shared secret. Case, whitespace, dashes and `=` padding
/// are ignored; trailing characters that cannot complete a byte are dropped.
/// Returns `None` for empty input or characters outside `A-Z2-7`.
#[must_use]
pub fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let mut cleaned: String = secret
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '=' && *ch != '-')
        .collect();
    // Base32 lengths of 1, 3 or 6 (mod 8) carry no complete trailing byte.
    while matches!(cleaned.len() % 8, 1 | 3 | 6) {
        cleaned.pop();
    }
    if cleaned.is_empty() {
        return None;
    }
    let decoded = base32_lenient().decode(cleaned.as_bytes()).ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(decoded)
}

/// Renders the code for the window containing `options.now_millis`.
///
/// An undecodable secret is replaced by an all-zero key so callers always get
/// a code; use [`decode_secret`] first to reject malformed secrets.
#[must_use]
pub fn generate_code(secret_base32: &str, options: &TotpOptions) -> String {
    let key = decode_secret(secret_base32)
        .unwrap_or_else(|| vec![0u8; options.algorithm.zero_key_len()]);
    let step = options.step_seconds.max(1);
    let counter = options.now_millis / 1000 / step;
    let digits = options.digits.clamp(1, MAX_DIGITS);
    hotp(&key, counter, digits, options.algorithm)
}

#[must_use]
pub fn seconds_remaining(step_seconds: u64, now_millis: u64) -> u64 {
    let step = step_seconds.max(1);
    step - (now_millis / 1000) % step
}

fn hotp(key: &[u8], counter: u64, digits: u32, algorithm: OtpAlgorithm) -> String {
    let message = counter.to_be_bytes();
    let digest = match algorithm {
        OtpAlgorithm::Sha1 => hmac_digest::<Hmac<Sha1>>(key, &message),
        OtpAlgorithm::Sha256 => hmac_digest::<Hmac<Sha256>>(key, &message),
        OtpAlgorithm::Sha512 => hmac_digest::<Hmac<Sha512>>(key, &message),
    };
    let Some(&last) = digest.last() else {
        return "0".repeat(digits as usize);
    };
    let offset = (last & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    let value = u64::from(binary) % 10u64.pow(digits);
    format!("{value:0width$}", width = digits as usize)
}

fn hmac_digest<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
