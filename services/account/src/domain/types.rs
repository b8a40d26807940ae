use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccountError;

/// Account lifecycle state.
///
/// `pending → active` happens once, on email verification. `inactive` and
/// `suspended` are set by operators and no account flow leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            other => Err(anyhow::anyhow!("unknown user status {other:?}")),
        }
    }
}

/// Stored account. Credential fields are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub two_factor_secret: Option<String>,
    pub two_factor_enabled: bool,
    pub two_factor_last_step: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("status", &self.status)
            .field("email_verified_at", &self.email_verified_at)
            .field(
                "two_factor_secret",
                &self.two_factor_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("two_factor_enabled", &self.two_factor_enabled)
            .field("two_factor_last_step", &self.two_factor_last_step)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// A freshly registered account: `pending`, unverified, no second factor.
    pub fn register(email: String, name: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email,
            name,
            password_hash,
            status: UserStatus::Pending,
            email_verified_at: None,
            two_factor_secret: None,
            two_factor_enabled: false,
            two_factor_last_step: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Login is gated on the second factor only when the flag is set and a
    /// secret is stored.
    pub fn is_two_factor_enabled(&self) -> bool {
        self.two_factor_enabled && self.two_factor_secret.is_some()
    }

    /// Verified email first, then `active` status.
    pub fn ensure_can_authenticate(&self) -> Result<(), AccountError> {
        if !self.is_email_verified() {
            return Err(AccountError::EmailNotVerified);
        }
        if !self.is_active() {
            return Err(AccountError::AccountInactive);
        }
        Ok(())
    }

    /// `pending → active`, stamping the verification time. Fails on a second call.
    pub fn verify_email(&mut self, now: DateTime<Utc>) -> Result<(), AccountError> {
        if self.is_email_verified() {
            return Err(AccountError::BadRequest("email already verified"));
        }
        self.email_verified_at = Some(now);
        if self.status == UserStatus::Pending {
            self.status = UserStatus::Active;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn replace_password(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }

    /// Store a new secret awaiting confirmation. Replaces any unconfirmed one.
    pub fn stage_two_factor(&mut self, secret: String, now: DateTime<Utc>) -> Result<(), AccountError> {
        if self.is_two_factor_enabled() {
            return Err(AccountError::BadRequest("two-factor authentication already enabled"));
        }
        self.two_factor_secret = Some(secret);
        self.two_factor_enabled = false;
        self.two_factor_last_step = None;
        self.updated_at = now;
        Ok(())
    }

    /// Record an accepted TOTP step, enabling the second factor on first use.
    pub fn accept_two_factor_step(&mut self, step: i64, now: DateTime<Utc>) {
        self.two_factor_enabled = true;
        self.two_factor_last_step = Some(step);
        self.updated_at = now;
    }

    pub fn disable_two_factor(&mut self, now: DateTime<Utc>) -> Result<(), AccountError> {
        if !self.is_two_factor_enabled() {
            return Err(AccountError::BadRequest("two-factor authentication is not enabled"));
        }
        self.two_factor_secret = None;
        self.two_factor_enabled = false;
        self.two_factor_last_step = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            status: self.status,
            email_verified: self.is_email_verified(),
            email_verified_at: self.email_verified_at,
            two_factor_enabled: self.is_two_factor_enabled(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public view of a [`User`]: no credential, no secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub email_verified: bool,
    #[serde(serialize_with = "passage_core::serde::to_rfc3339_ms_opt")]
    pub email_verified_at: Option<DateTime<Utc>>,
    pub two_factor_enabled: bool,
    #[serde(serialize_with = "passage_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "passage_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

/// A signed bearer token with its expiry (seconds since UNIX epoch).
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// What a one-time code proves. Each purpose has its own key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    EmailVerification,
    PasswordReset,
}

impl CodePurpose {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    /// `<purpose>:<email>`
    pub fn key(self, email: &str) -> String {
        format!("{}:{}", self.prefix(), email)
    }

    pub fn notification_kind(self) -> &'static str {
        match self {
            Self::EmailVerification => NOTIFY_VERIFY_EMAIL,
            Self::PasswordReset => NOTIFY_FORGOT_PASSWORD,
        }
    }
}

/// Outbox event for async delivery (verification and reset emails).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Payload of both code emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEmailPayload {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub verification_code: String,
    /// Code lifetime in minutes, for the email body.
    pub verification_code_expiration: u64,
}

impl CodeEmailPayload {
    pub fn into_event(self, purpose: CodePurpose) -> Result<OutboxEvent, AccountError> {
        let id = Uuid::now_v7();
        let kind = purpose.notification_kind();
        Ok(OutboxEvent {
            id,
            kind: kind.to_owned(),
            idempotency_key: format!("{kind}:{}:{id}", self.user_id),
            payload: serde_json::to_value(self).map_err(anyhow::Error::from)?,
        })
    }
}

pub const NOTIFY_VERIFY_EMAIL: &str = "send_verify_email";
pub const NOTIFY_FORGOT_PASSWORD: &str = "send_forgot_password_email";

/// Rate-limiter key namespace.
pub const RATE_LIMIT_PREFIX: &str = "auth";

/// Operation names used in rate-limiter keys (`auth:<operation>:<id>`).
pub mod operation {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const VERIFY_OTP: &str = "verify_otp";
    pub const RESEND_OTP: &str = "resend_otp";
    pub const FORGOT_PASSWORD: &str = "forgot_password";
    pub const RESET_PASSWORD: &str = "reset_password";
    pub const VERIFY_TWO_FACTOR: &str = "verify_2fa";
}

pub fn rate_limit_key(operation: &str, identifier: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}:{operation}:{identifier}")
}
