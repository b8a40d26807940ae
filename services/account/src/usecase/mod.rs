//! Account lifecycle flows. [`AccountService`] holds the ports; each flow
//! lives in its own module as an `impl` block.

pub mod login;
pub mod otp;
pub mod password;
pub mod register;
pub mod token;
pub mod two_factor;

use passage_token::token::TokenKind;
use subtle::ConstantTimeEq;
use tracing::warn;
use uuid::Uuid;

use crate::config::AccountSettings;
use crate::domain::repository::{
    CodeStore, PasswordHasher, RateLimiter, TokenIssuer, UserRepository, UserUnitOfWork,
};
use crate::domain::types::{CodeEmailPayload, CodePurpose, TokenPair, User, rate_limit_key};
use crate::error::AccountError;
use crate::infra::totp::TotpScheme;

/// The set of adapters one [`AccountService`] runs on.
pub trait AccountPorts: Send + Sync + 'static {
    type Users: UserRepository;
    type Codes: CodeStore;
    type Limiter: RateLimiter;
    type Hasher: PasswordHasher;
    type Tokens: TokenIssuer;
}

type UnitOfWork<P> = <<P as AccountPorts>::Users as UserRepository>::UnitOfWork;

pub struct AccountService<P: AccountPorts> {
    users: P::Users,
    codes: P::Codes,
    limiter: P::Limiter,
    hasher: P::Hasher,
    tokens: P::Tokens,
    totp: TotpScheme,
    settings: AccountSettings,
}

impl<P: AccountPorts> AccountService<P> {
    pub fn new(
        users: P::Users,
        codes: P::Codes,
        limiter: P::Limiter,
        hasher: P::Hasher,
        tokens: P::Tokens,
        settings: AccountSettings,
    ) -> Self {
        Self {
            totp: TotpScheme::new(settings.app_name.clone()),
            users,
            codes,
            limiter,
            hasher,
            tokens,
            settings,
        }
    }

    pub fn users(&self) -> &P::Users {
        &self.users
    }

    pub fn codes(&self) -> &P::Codes {
        &self.codes
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    /// Runs before validation: malformed requests count against the limit too.
    async fn check_rate_limit(&self, operation: &str, identifier: &str) -> Result<(), AccountError> {
        if self.limiter.take(&rate_limit_key(operation, identifier)).await? {
            warn!(operation, "rate limit exceeded");
            return Err(AccountError::TooManyRequests);
        }
        Ok(())
    }

    fn issue_pair(&self, user_id: Uuid, remember: bool) -> Result<TokenPair, AccountError> {
        let (access_ttl, refresh_ttl) = if remember {
            (self.settings.access_ttl_extended, self.settings.refresh_ttl_extended)
        } else {
            (self.settings.access_ttl, self.settings.refresh_ttl)
        };
        Ok(TokenPair {
            access: self.tokens.issue(user_id, TokenKind::Access, access_ttl)?,
            refresh: self.tokens.issue(user_id, TokenKind::Refresh, refresh_ttl)?,
        })
    }

    /// Store a fresh code for `user` and queue its email inside `uow`.
    /// The email goes out only if `uow` commits.
    async fn send_code(
        &self,
        uow: &mut UnitOfWork<P>,
        user: &User,
        purpose: CodePurpose,
    ) -> Result<(), AccountError> {
        let code = otp::generate_code();
        self.codes
            .set(&purpose.key(&user.email), &code, self.settings.otp_ttl)
            .await?;
        let event = CodeEmailPayload {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            verification_code: code,
            verification_code_expiration: self.settings.otp_ttl.as_secs() / 60,
        }
        .into_event(purpose)?;
        uow.enqueue(&event).await
    }

    /// Absent or expired → `CodeExpired`; mismatch → `InvalidCode`. The
    /// stored code survives a mismatch so the user can retry.
    async fn check_code(
        &self,
        purpose: CodePurpose,
        email: &str,
        submitted: &str,
    ) -> Result<(), AccountError> {
        let stored = self
            .codes
            .get(&purpose.key(email))
            .await?
            .ok_or(AccountError::CodeExpired)?;
        if !bool::from(stored.as_bytes().ct_eq(submitted.as_bytes())) {
            return Err(AccountError::InvalidCode);
        }
        Ok(())
    }

    /// Remove a consumed code. The owning change is already committed, so a
    /// failure here is logged rather than returned.
    async fn discard_code(&self, purpose: CodePurpose, email: &str) {
        if let Err(e) = self.codes.delete(&purpose.key(email)).await {
            warn!(error = ?e, purpose = purpose.prefix(), "failed to delete consumed code");
        }
    }
}
