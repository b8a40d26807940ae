//! RFC 6238 TOTP: SHA-1, 6 digits, 30 s step, 20-byte secret. These are the
//! parameters every mainstream authenticator app accepts.

use anyhow::anyhow;
use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AccountError;

pub const TOTP_DIGITS: usize = 6;
pub const TOTP_STEP_SECS: u64 = 30;
/// Accepted steps either side of the current one.
pub const TOTP_SKEW: u8 = 1;

/// Material returned by two-factor setup.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpEnrollment {
    /// Base32 secret, for manual entry.
    pub secret: String,
    /// `otpauth://totp/...` provisioning URI.
    pub otpauth_url: String,
    /// The URI as a `data:image/png;base64,...` QR code.
    pub qr_code: String,
}

impl std::fmt::Debug for TotpEnrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpEnrollment").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TotpScheme {
    issuer: String,
}

impl TotpScheme {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    fn totp(&self, secret: Vec<u8>, account: &str) -> Result<TOTP, AccountError> {
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP_SECS,
            secret,
            Some(self.issuer.clone()),
            account.to_owned(),
        )
        .map_err(|e| anyhow!("build totp: {e}").into())
    }

    fn decode(secret: &str) -> Result<Vec<u8>, AccountError> {
        Secret::Encoded(secret.to_owned())
            .to_bytes()
            .map_err(|e| anyhow!("decode totp secret: {e:?}").into())
    }

    /// Fresh random secret with its provisioning URI and QR image.
    pub fn enroll(&self, account: &str) -> Result<TotpEnrollment, AccountError> {
        let raw = Secret::generate_secret()
            .to_bytes()
            .map_err(|e| anyhow!("generate totp secret: {e:?}"))?;
        let totp = self.totp(raw, account)?;
        let otpauth_url = provisioning_url(&totp);
        let qr = qrcodegen_image::draw_base64(&otpauth_url)
            .map_err(|e| anyhow!("render totp qr code: {e}"))?;
        Ok(TotpEnrollment {
            secret: totp.get_secret_base32(),
            otpauth_url,
            qr_code: format!("data:image/png;base64,{qr}"),
        })
    }

    /// Time step that `code` matches at `unix_secs`, within the skew window
    /// and strictly after `last_step`. `None` for a wrong or replayed code.
    pub fn matching_step(
        &self,
        secret: &str,
        code: &str,
        unix_secs: u64,
        last_step: Option<i64>,
    ) -> Result<Option<i64>, AccountError> {
        let totp = self.totp(Self::decode(secret)?, "verify")?;
        let current = (unix_secs / TOTP_STEP_SECS) as i64;
        let skew = i64::from(TOTP_SKEW);

        let mut matched = None;
        for step in (current - skew)..=(current + skew) {
            if step < 0 || last_step.is_some_and(|last| step <= last) {
                continue;
            }
            let expected = totp.generate(step as u64 * TOTP_STEP_SECS);
            if bool::from(expected.as_bytes().ct_eq(code.as_bytes())) {
                matched = Some(step);
            }
        }
        Ok(matched)
    }
}

/// `totp-rs` omits parameters equal to their defaults; some authenticators
/// need them spelled out.
fn provisioning_url(totp: &TOTP) -> String {
    format!(
        "{}&algorithm={}&digits={}&period={}",
        totp.get_url(),
        totp.algorithm,
        totp.digits,
        totp.step
    )
}
