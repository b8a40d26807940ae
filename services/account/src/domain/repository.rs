//! Ports the account service depends on. Adapters live in `crate::infra`;
//! in-memory doubles live in the integration tests.
//!
//! Methods return `impl Future + Send` so generic axum handlers over these
//! traits stay `Send`.

use std::future::Future;
use std::time::Duration;

use passage_token::token::TokenKind;
use uuid::Uuid;

use crate::domain::types::{IssuedToken, OutboxEvent, User};
use crate::error::AccountError;

/// Credential store.
pub trait UserRepository: Send + Sync + 'static {
    type UnitOfWork: UserUnitOfWork;

    /// Open a unit of work. Dropping it without [`UserUnitOfWork::commit`]
    /// rolls every write back, including when the request is cancelled.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork, AccountError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, AccountError>> + Send;

    fn find_by_id(&self, id: Uuid)
    -> impl Future<Output = Result<Option<User>, AccountError>> + Send;

    /// Readiness probe.
    fn ping(&self) -> impl Future<Output = bool> + Send;
}

/// Transactional view of the credential store plus the notification outbox.
pub trait UserUnitOfWork: Send {
    fn find_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, AccountError>> + Send;

    fn find_by_id(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, AccountError>> + Send;

    /// Insert. A taken email yields [`AccountError::Conflict`].
    fn create(&mut self, user: &User) -> impl Future<Output = Result<(), AccountError>> + Send;

    fn update(&mut self, user: &User) -> impl Future<Output = Result<(), AccountError>> + Send;

    /// Queue a notification; it is delivered only if this unit commits.
    fn enqueue(
        &mut self,
        event: &OutboxEvent,
    ) -> impl Future<Output = Result<(), AccountError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), AccountError>> + Send;
}

/// Short-lived key/value store for one-time codes.
pub trait CodeStore: Send + Sync + 'static {
    /// Write `code` under `key`, replacing any live value.
    fn set(
        &self,
        key: &str,
        code: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), AccountError>> + Send;

    /// `None` when absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, AccountError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), AccountError>> + Send;

    /// Readiness probe.
    fn ping(&self) -> impl Future<Output = bool> + Send;
}

pub trait RateLimiter: Send + Sync + 'static {
    /// Count one request against `key`. `Ok(true)` means the limit is exceeded.
    fn take(&self, key: &str) -> impl Future<Output = Result<bool, AccountError>> + Send;
}

pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, plain: &str) -> impl Future<Output = Result<String, AccountError>> + Send;

    fn verify(
        &self,
        plain: &str,
        hash: &str,
    ) -> impl Future<Output = Result<bool, AccountError>> + Send;

    /// A valid hash of no real password. Verifying against it costs the same
    /// as a real check, so unknown-email logins take as long as wrong passwords.
    fn decoy_hash(&self) -> &str;
}

/// Token issuer. Signing and verification are CPU-only, so these are sync.
pub trait TokenIssuer: Send + Sync + 'static {
    fn issue(&self, subject: Uuid, kind: TokenKind, ttl: Duration)
    -> Result<IssuedToken, AccountError>;

    /// Subject of a valid, unexpired token of the given kind, else `InvalidToken`.
    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, AccountError>;
}
