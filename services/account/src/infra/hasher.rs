use anyhow::{Context as _, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{self, PasswordHasher as _, SaltString, rand_core},
};

use crate::domain::repository::PasswordHasher;
use crate::error::AccountError;

/// Argon2id, PHC string output, random salt per hash. Runs on the blocking pool.
#[derive(Clone)]
pub struct Argon2Hasher {
    decoy: String,
}

fn argon2() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(15000, 2, 1, None).map_err(password_hash::Error::from)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_blocking(plain: &[u8]) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(rand_core::OsRng);
    Ok(argon2()?.hash_password(plain, &salt)?.to_string())
}

fn verify_blocking(plain: &[u8], hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match argon2()?.verify_password(plain, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

impl Argon2Hasher {
    /// Builds the decoy hash up front; call once at startup.
    pub fn new() -> Result<Self, AccountError> {
        let decoy = hash_blocking(b"decoy").map_err(|e| anyhow!("decoy hash: {e}"))?;
        Ok(Self { decoy })
    }
}

impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, plain: &str) -> Result<String, AccountError> {
        let plain = plain.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash_blocking(plain.as_bytes()))
            .await
            .context("hash task")?
            .map_err(|e| anyhow!("hash password: {e}"))?;
        Ok(hashed)
    }

    async fn verify(&self, plain: &str, hash: &str) -> Result<bool, AccountError> {
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        let ok = tokio::task::spawn_blocking(move || verify_blocking(plain.as_bytes(), &hash))
            .await
            .context("verify task")?
            .map_err(|e| anyhow!("verify password: {e}"))?;
        Ok(ok)
    }

    fn decoy_hash(&self) -> &str {
        &self.decoy
    }
}
