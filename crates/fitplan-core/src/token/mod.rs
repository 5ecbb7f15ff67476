//! User access tokens.
//!
//! HMAC-SHA256 tokens bound to a user and an issue time.
//! Format: `fitplan_ut_<user_id>_<issued_unix_secs>_<hmac_hex>`, where the
//! MAC covers `<user_id>:<issued_unix_secs>`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "fitplan_ut_";
const UUID_LEN: usize = 36;

/// Tokens are valid for a week unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("invalid issue time in token: {0}")]
    InvalidIssuedAt(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("token expired")]
    Expired,

    #[error("missing token secret")]
    MissingSecret,
}

#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    pub ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Decode a hex secret, as stored in the config file or passed through
    /// `FITPLAN_TOKEN_SECRET`.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        let secret_hex = secret_hex.trim();
        if secret_hex.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let secret = hex::decode(secret_hex)
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        Ok(Self::new(secret))
    }

    pub fn from_env() -> Result<Self, TokenError> {
        let secret_hex =
            std::env::var("FITPLAN_TOKEN_SECRET").map_err(|_| TokenError::MissingSecret)?;
        Self::from_hex(&secret_hex)
    }
}

/// Claims of a validated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
}

/// Issue a token for `user_id` stamped with the current time.
pub fn issue_token(config: &TokenConfig, user_id: Uuid) -> String {
    generate_token(config, user_id, Utc::now().timestamp())
}

pub fn generate_token(config: &TokenConfig, user_id: Uuid, issued_at: i64) -> String {
    let mac = compute_hmac(&config.secret, &signed_message(user_id, issued_at));
    format!("{TOKEN_PREFIX}{user_id}_{issued_at}_{}", hex::encode(mac))
}

/// Validate `token` as of the current time.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<UserClaims, TokenError> {
    validate_token_at(config, token, Utc::now().timestamp())
}

/// Validate `token` as of `now` (unix seconds).
///
/// The MAC is checked before the age, so a forged token never reports
/// `Expired`.
pub fn validate_token_at(
    config: &TokenConfig,
    token: &str,
    now: i64,
) -> Result<UserClaims, TokenError> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or_else(|| TokenError::InvalidFormat(format!("token must start with '{TOKEN_PREFIX}'")))?;

    if rest.len() < UUID_LEN || !rest.is_char_boundary(UUID_LEN) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a user ID".to_owned(),
        ));
    }
    let (user_str, after_user) = rest.split_at(UUID_LEN);
    let user_id =
        Uuid::parse_str(user_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let (issued_str, mac_hex) = after_user
        .strip_prefix('_')
        .and_then(|s| s.split_once('_'))
        .ok_or_else(|| {
            TokenError::InvalidFormat("expected <user>_<issued>_<hmac>".to_owned())
        })?;
    let issued_at: i64 = issued_str
        .parse()
        .map_err(|e: std::num::ParseIntError| TokenError::InvalidIssuedAt(e.to_string()))?;

    let provided = hex::decode(mac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;
    verify_hmac(&config.secret, &signed_message(user_id, issued_at), &provided)?;

    let ttl = i64::try_from(config.ttl.as_secs()).unwrap_or(i64::MAX);
    if now.saturating_sub(issued_at) > ttl {
        return Err(TokenError::Expired);
    }

    Ok(UserClaims { user_id, issued_at })
}

fn signed_message(user_id: Uuid, issued_at: i64) -> Vec<u8> {
    format!("{user_id}:{issued_at}").into_bytes()
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size")
}

fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison via `verify_slice`.
fn verify_hmac(key: &[u8], message: &[u8], expected: &[u8]) -> Result<(), TokenError> {
    let mut mac = new_mac(key);
    mac.update(message);
    mac.verify_slice(expected)
        .map_err(|_| TokenError::HmacMismatch)
}
