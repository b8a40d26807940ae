use std::time::Duration;

use serde::Deserialize;

use passage_core::config::Config;
use passage_core::tracing::LogFormat;
use passage_token::token::{KeySet, SigningKey, TokenError};

/// Account service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AccountConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (one-time codes and rate-limit counters).
    pub redis_url: String,
    /// HMAC secret for the current signing key, at least 32 bytes.
    pub jwt_secret: String,
    /// `kid` header written with the current key.
    #[serde(default = "default_key_id")]
    pub jwt_key_id: String,
    /// Comma-separated `kid=secret` pairs still accepted for verification.
    #[serde(default)]
    pub jwt_retired_keys: String,
    /// Token issuer and authenticator-app label.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// TCP port to listen on. Env var: `ACCOUNT_PORT`.
    #[serde(default = "default_port")]
    pub account_port: u16,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_access_ttl_extended")]
    pub access_token_ttl_extended_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_extended")]
    pub refresh_token_ttl_extended_secs: u64,
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: u64,
    #[serde(default = "default_challenge_ttl")]
    pub two_factor_challenge_ttl_secs: u64,
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u64,
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_outbox_poll_interval")]
    pub outbox_poll_interval_ms: u64,
    #[serde(default = "default_outbox_batch_size")]
    pub outbox_batch_size: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config for AccountConfig {}

fn default_key_id() -> String {
    "primary".to_owned()
}
fn default_app_name() -> String {
    "passage".to_owned()
}
fn default_port() -> u16 {
    3120
}
fn default_access_ttl() -> u64 {
    15 * 60
}
fn default_access_ttl_extended() -> u64 {
    24 * 60 * 60
}
fn default_refresh_ttl() -> u64 {
    7 * 24 * 60 * 60
}
fn default_refresh_ttl_extended() -> u64 {
    30 * 24 * 60 * 60
}
fn default_otp_ttl() -> u64 {
    15 * 60
}
fn default_challenge_ttl() -> u64 {
    5 * 60
}
fn default_rate_limit_max() -> u64 {
    100
}
fn default_rate_limit_window() -> u64 {
    60
}
fn default_request_timeout() -> u64 {
    15
}
fn default_outbox_poll_interval() -> u64 {
    1000
}
fn default_outbox_batch_size() -> u64 {
    32
}

impl AccountConfig {
    /// Current key plus retired keys. Fails on a short secret or a malformed list.
    pub fn key_set(&self) -> Result<KeySet, TokenError> {
        let current = SigningKey::new(self.jwt_key_id.clone(), self.jwt_secret.as_bytes())?;
        let retired = KeySet::parse_key_list(&self.jwt_retired_keys)?;
        Ok(KeySet::new(self.app_name.clone(), current).with_retired(retired))
    }

    pub fn settings(&self) -> AccountSettings {
        AccountSettings {
            app_name: self.app_name.clone(),
            access_ttl: Duration::from_secs(self.access_token_ttl_secs),
            access_ttl_extended: Duration::from_secs(self.access_token_ttl_extended_secs),
            refresh_ttl: Duration::from_secs(self.refresh_token_ttl_secs),
            refresh_ttl_extended: Duration::from_secs(self.refresh_token_ttl_extended_secs),
            otp_ttl: Duration::from_secs(self.otp_ttl_secs),
            two_factor_challenge_ttl: Duration::from_secs(self.two_factor_challenge_ttl_secs),
        }
    }
}

/// Lifetimes and labels the account flows need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// TOTP issuer label.
    pub app_name: String,
    pub access_ttl: Duration,
    pub access_ttl_extended: Duration,
    pub refresh_ttl: Duration,
    pub refresh_ttl_extended: Duration,
    pub otp_ttl: Duration,
    pub two_factor_challenge_ttl: Duration,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            access_ttl: Duration::from_secs(default_access_ttl()),
            access_ttl_extended: Duration::from_secs(default_access_ttl_extended()),
            refresh_ttl: Duration::from_secs(default_refresh_ttl()),
            refresh_ttl_extended: Duration::from_secs(default_refresh_ttl_extended()),
            otp_ttl: Duration::from_secs(default_otp_ttl()),
            two_factor_challenge_ttl: Duration::from_secs(default_challenge_ttl()),
        }
    }
}
