use chrono::Utc;
use rand::RngExt;
use tracing::{debug, info};

use crate::domain::repository::{UserRepository, UserUnitOfWork};
use crate::domain::types::{CodePurpose, UserProfile, operation};
use crate::domain::validation::{CODE_LEN, FieldErrors, check_code, check_email, normalize_email};
use crate::error::AccountError;

use super::{AccountPorts, AccountService};

/// Six uniformly random decimal digits.
pub(crate) fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

pub struct VerifyOtpInput {
    pub email: String,
    pub code: String,
}

pub struct ResendOtpInput {
    pub email: String,
}

impl<P: AccountPorts> AccountService<P> {
    /// Confirm the email address with the code sent at registration and
    /// activate the account.
    #[tracing::instrument(skip_all)]
    pub async fn verify_otp(&self, input: VerifyOtpInput) -> Result<UserProfile, AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::VERIFY_OTP, &email).await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        check_code(&mut errors, "code", &input.code);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        // An unknown email looks like a wrong code.
        let mut user = uow
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCode)?;
        if user.is_email_verified() {
            return Err(AccountError::BadRequest("email already verified"));
        }

        self.check_code(CodePurpose::EmailVerification, &email, &input.code)
            .await?;
        user.verify_email(Utc::now())?;
        uow.update(&user).await?;
        uow.commit().await?;
        self.discard_code(CodePurpose::EmailVerification, &email)
            .await;

        info!(user_id = %user.id, "email verified");
        Ok(user.profile())
    }

    /// Replace the pending verification code and email it again.
    ///
    /// Unknown and already verified emails succeed without sending anything.
    #[tracing::instrument(skip_all)]
    pub async fn resend_otp(&self, input: ResendOtpInput) -> Result<(), AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::RESEND_OTP, &email).await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        let Some(user) = uow.find_by_email(&email).await? else {
            debug!("resend for unknown email");
            return Ok(());
        };
        if user.is_email_verified() {
            debug!(user_id = %user.id, "resend for verified email");
            return Ok(());
        }

        self.send_code(&mut uow, &user, CodePurpose::EmailVerification)
            .await?;
        uow.commit().await?;

        info!(user_id = %user.id, "verification code resent");
        Ok(())
    }
}
