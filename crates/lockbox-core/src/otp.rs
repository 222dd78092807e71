use lockbox_crypto::{
    decode_secret, generate_code, seconds_remaining, OtpAlgorithm, TotpOptions, DEFAULT_DIGITS,
    DEFAULT_STEP_SECONDS,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::models::VaultRecord;

const OTPAUTH_SCHEME: &str = "otpauth";
const NOTES_PREFIX: &str = "otp:";
const MIN_DIGITS: u32 = 6;
const MAX_DIGITS: u32 = 10;

/// OTP settings attached to a record, whichever legacy form carried them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpConfig {
    pub secret: String,
    pub digits: u32,
    pub algorithm: OtpAlgorithm,
    pub step: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl OtpConfig {
    /// Reads an `otpauth://` URI from `password`, else an `otp:` line from
    /// `notes`. Records whose secret does not decode yield `None`.
    #[must_use]
    pub fn from_record(record: &VaultRecord) -> Option<Self> {
        if let Some(config) = record.password.as_deref().and_then(Self::parse_otpauth) {
            return Some(config);
        }
        record.notes.as_deref().and_then(Self::parse_notes)
    }

    /// `otpauth://totp/Label?secret=...&digits=...&algorithm=...&period=...`
    #[must_use]
    pub fn parse_otpauth(value: &str) -> Option<Self> {
        let url = Url::parse(value.trim()).ok()?;
        if url.scheme() != OTPAUTH_SCHEME || url.host_str() != Some("totp") {
            return None;
        }
        let mut builder = OtpBuilder::default();
        for (key, value) in url.query_pairs() {
            builder.set(&key, &value);
        }
        if builder.issuer.is_none() {
            let label = url.path().trim_start_matches('/');
            let label = decode_label(label);
            builder.issuer = label
                .split_once(':')
                .map(|(issuer, _)| issuer.trim().to_string())
                .filter(|issuer| !issuer.is_empty());
        }
        builder.build()
    }

    /// `otp:secret=...;digits=...;algorithm=...;step=...` on any line of the
    /// notes.
    #[must_use]
    pub fn parse_notes(notes: &str) -> Option<Self> {
        let line = notes
            .lines()
            .map(str::trim)
            .find(|line| line.to_ascii_lowercase().starts_with(NOTES_PREFIX))?;
        let mut builder = OtpBuilder::default();
        for pair in line[NOTES_PREFIX.len()..].split(';') {
            if let Some((key, value)) = pair.split_once('=') {
                builder.set(key.trim(), value.trim());
            }
        }
        builder.build()
    }

    #[must_use]
    pub fn code_at(&self, now_millis: u64) -> String {
        generate_code(
            &self.secret,
            &TotpOptions {
                digits: self.digits,
                algorithm: self.algorithm,
                step_seconds: self.step,
                now_millis,
            },
        )
    }

    #[must_use]
    pub fn seconds_remaining(&self, now_millis: u64) -> u64 {
        seconds_remaining(self.step, now_millis)
    }
}

#[derive(Default)]
struct OtpBuilder {
    secret: Option<String>,
    digits: Option<u32>,
    algorithm: Option<OtpAlgorithm>,
    step: Option<u64>,
    issuer: Option<String>,
}

impl OtpBuilder {
    fn set(&mut self, key: &str, value: &str) {
        match key.to_ascii_lowercase().as_str() {
            "secret" | "key" => self.secret = Some(value.to_string()),
            "digits" => self.digits = value.parse().ok(),
            "algorithm" | "algo" => self.algorithm = OtpAlgorithm::parse(value),
            "step" | "period" => self.step = value.parse().ok().filter(|step| *step > 0),
            "issuer" => {
                self.issuer = Some(value.to_string()).filter(|issuer| !issuer.is_empty());
            }
            _ => {}
        }
    }

    fn build(self) -> Option<OtpConfig> {
        let secret = self.secret?;
        if decode_secret(&secret).is_none() {
            debug!(event = "otp_secret_rejected");
            return None;
        }
        Some(OtpConfig {
            secret,
            digits: self
                .digits
                .filter(|digits| (MIN_DIGITS..=MAX_DIGITS).contains(digits))
                .unwrap_or(DEFAULT_DIGITS),
            algorithm: self.algorithm.unwrap_or_default(),
            step: self.step.unwrap_or(DEFAULT_STEP_SECONDS),
            issuer: self.issuer,
        })
    }
}

fn decode_label(label: &str) -> String {
    url::form_urlencoded::parse(format!("l={label}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
