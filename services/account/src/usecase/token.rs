use passage_token::token::TokenKind;
use tracing::info;
use uuid::Uuid;

use crate::domain::repository::{TokenIssuer, UserRepository};
use crate::domain::types::{TokenPair, UserProfile};
use crate::error::AccountError;

use super::{AccountPorts, AccountService};

impl<P: AccountPorts> AccountService<P> {
    /// Exchange a refresh token for a new pair with the default lifetimes.
    /// The user must still be verified and active.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AccountError> {
        let user_id = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        user.ensure_can_authenticate()?;

        let tokens = self.issue_pair(user.id, false)?;
        info!(user_id = %user.id, "token refreshed");
        Ok(tokens)
    }

    /// Subject of a bearer access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AccountError> {
        self.tokens.verify(access_token, TokenKind::Access)
    }

    /// Subject of a token presented to 2FA verification: an access token
    /// when confirming setup, a challenge token when completing login.
    pub fn authenticate_two_factor(&self, token: &str) -> Result<Uuid, AccountError> {
        self.tokens
            .verify(token, TokenKind::Access)
            .or_else(|_| self.tokens.verify(token, TokenKind::TwoFactor))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AccountError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.profile())
            .ok_or(AccountError::UserNotFound)
    }
}
