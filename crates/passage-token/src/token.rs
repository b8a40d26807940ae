//! JWT bearer tokens: claims, signing keys with rotation, verification.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// What a token may be used for. Carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    /// Proof of a correct password while the second factor is still pending.
    TwoFactor,
}

/// JWT claims payload shared by token creation (account service) and validation.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `sub` | user ID (UUID string) |
/// | `typ` | [`TokenKind`] |
/// | `iss` | issuing application name |
/// | `iat` / `nbf` / `exp` | seconds since UNIX epoch |
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct JwtClaims {
    pub sub: String,
    pub typ: TokenKind,
    pub iss: String,
    pub iat: u64,
    pub nbf: u64,
    pub exp: u64,
}

/// Identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub expires_at: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("unknown signing key")]
    UnknownKey,
    #[error("token used for the wrong purpose")]
    WrongKind,
    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    #[error("malformed key list entry: {0}")]
    BadKeySpec(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// HMAC secret identified by the `kid` JWT header.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(kid: impl Into<String>, secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret);
        }
        Ok(Self {
            kid: kid.into(),
            secret,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The current signing key plus retired keys that still verify.
///
/// Rotating a secret: deploy the new secret as current and move the old one
/// to the retired list; drop it once the longest refresh TTL has passed.
#[derive(Debug, Clone)]
pub struct KeySet {
    issuer: String,
    current: SigningKey,
    retired: Vec<SigningKey>,
}

impl KeySet {
    pub fn new(issuer: impl Into<String>, current: SigningKey) -> Self {
        Self {
            issuer: issuer.into(),
            current,
            retired: Vec::new(),
        }
    }

    pub fn with_retired(mut self, keys: impl IntoIterator<Item = SigningKey>) -> Self {
        self.retired.extend(keys);
        self
    }

    /// Parse a `kid=secret,kid=secret` list. Blank input yields no keys.
    pub fn parse_key_list(list: &str) -> Result<Vec<SigningKey>, TokenError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (kid, secret) = entry
                    .split_once('=')
                    .ok_or_else(|| TokenError::BadKeySpec(entry.to_owned()))?;
                SigningKey::new(kid.trim(), secret.trim().as_bytes())
            })
            .collect()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn find(&self, kid: Option<&str>) -> Option<&SigningKey> {
        match kid {
            None => Some(&self.current),
            Some(kid) => std::iter::once(&self.current)
                .chain(self.retired.iter())
                .find(|key| key.kid == kid),
        }
    }

    /// Verify signature, issuer, `nbf`/`exp` and the expected [`TokenKind`].
    ///
    /// Default leeway = 60s, tolerating clock skew between services.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenInfo, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        let key = self
            .find(header.kid.as_deref())
            .ok_or(TokenError::UnknownKey)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(&key.secret),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

        if data.claims.typ != expected {
            return Err(TokenError::WrongKind);
        }
        let user_id = data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| TokenError::Malformed)?;
        Ok(TokenInfo {
            user_id,
            kind: data.claims.typ,
            expires_at: data.claims.exp,
        })
    }
}

// ── Feature-gated: account service only ──────────────────────────────────

/// A freshly signed token and its expiry (seconds since UNIX epoch).
#[cfg(any(feature = "issuer", test))]
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: u64,
}

#[cfg(any(feature = "issuer", test))]
impl KeySet {
    /// Sign a token for `subject` with the current key, valid for `ttl_secs`.
    pub fn sign(
        &self,
        subject: Uuid,
        kind: TokenKind,
        ttl_secs: u64,
    ) -> Result<SignedToken, TokenError> {
        let now = now_secs();
        let claims = JwtClaims {
            sub: subject.to_string(),
            typ: kind,
            iss: self.issuer.clone(),
            iat: now,
            nbf: now,
            exp: now + ttl_secs,
        };
        let mut header = jsonwebtoken::Header::new(Algorithm::HS256);
        header.kid = Some(self.current.kid.clone());
        let token = jsonwebtoken::encode(
            &header,
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(&self.current.secret),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(SignedToken {
            token,
            expires_at: claims.exp,
        })
    }
}

/// Current UNIX time in seconds. A clock before the epoch reads as 0.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
