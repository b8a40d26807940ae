pub mod account;
pub mod auth;
pub mod health;
pub mod two_factor;

use serde::Serialize;

use crate::domain::types::{IssuedToken, TokenPair};

/// Wire form of an issued token pair.
#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub token_type: &'static str,
    pub access_token: String,
    pub access_token_expires_at: u64,
    pub refresh_token: String,
    pub refresh_token_expires_at: u64,
}

impl From<TokenPair> for TokensResponse {
    fn from(pair: TokenPair) -> Self {
        let TokenPair {
            access: IssuedToken {
                token: access_token,
                expires_at: access_token_expires_at,
            },
            refresh: IssuedToken {
                token: refresh_token,
                expires_at: refresh_token_expires_at,
            },
        } = pair;
        Self {
            token_type: "Bearer",
            access_token,
            access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
        }
    }
}
