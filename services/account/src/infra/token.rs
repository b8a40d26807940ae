use std::time::Duration;

use passage_token::token::{KeySet, TokenKind};
use uuid::Uuid;

use crate::domain::repository::TokenIssuer;
use crate::domain::types::IssuedToken;
use crate::error::AccountError;

/// HS256 JWTs over a rotating [`KeySet`].
#[derive(Debug, Clone)]
pub struct JwtTokenIssuer {
    pub keys: KeySet,
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(
        &self,
        subject: Uuid,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, AccountError> {
        let signed = self
            .keys
            .sign(subject, kind, ttl.as_secs())
            .map_err(|e| anyhow::anyhow!("sign {kind:?} token: {e}"))?;
        Ok(IssuedToken {
            token: signed.token,
            expires_at: signed.expires_at,
        })
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, AccountError> {
        self.keys
            .verify(token, kind)
            .map(|info| info.user_id)
            .map_err(|e| {
                tracing::debug!(reason = %e, ?kind, "token rejected");
                AccountError::InvalidToken
            })
    }
}
