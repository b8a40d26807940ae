//! Bearer-token extractors resolving the caller's user id.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use passage_token::bearer::BearerToken;

use crate::error::AccountError;
use crate::state::AppState;
use crate::usecase::AccountPorts;

/// Caller authenticated by an access token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Caller of 2FA verification: an access token or a login challenge token.
#[derive(Debug, Clone, Copy)]
pub struct TwoFactorSubject(pub Uuid);

async fn bearer<P: AccountPorts>(
    parts: &mut Parts,
    state: &AppState<P>,
) -> Result<String, AccountError> {
    BearerToken::from_request_parts(parts, state)
        .await
        .map(|BearerToken(token)| token)
        .map_err(|_| AccountError::InvalidToken)
}

impl<P: AccountPorts> FromRequestParts<AppState<P>> for CurrentUser {
    type Rejection = AccountError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts, state).await?;
        state.service.authenticate(&token).map(Self)
    }
}

impl<P: AccountPorts> FromRequestParts<AppState<P>> for TwoFactorSubject {
    type Rejection = AccountError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts, state).await?;
        state.service.authenticate_two_factor(&token).map(Self)
    }
}
