use chrono::Utc;
use tracing::{debug, info};

use crate::domain::repository::{PasswordHasher, UserRepository, UserUnitOfWork};
use crate::domain::types::{CodePurpose, operation};
use crate::domain::validation::{
    FieldErrors, check_code, check_email, check_password, normalize_email,
};
use crate::error::AccountError;

use super::{AccountPorts, AccountService};

pub struct ForgotPasswordInput {
    pub email: String,
}

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

impl<P: AccountPorts> AccountService<P> {
    /// Email a password-reset code. Succeeds whether or not the email is
    /// registered.
    #[tracing::instrument(skip_all)]
    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<(), AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::FORGOT_PASSWORD, &email)
            .await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        let Some(user) = uow.find_by_email(&email).await? else {
            debug!("password reset for unknown email");
            return Ok(());
        };

        self.send_code(&mut uow, &user, CodePurpose::PasswordReset)
            .await?;
        uow.commit().await?;

        info!(user_id = %user.id, "password reset code sent");
        Ok(())
    }

    /// Replace the password using a reset code. Issued tokens stay valid
    /// until they expire.
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::RESET_PASSWORD, &email)
            .await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        check_code(&mut errors, "code", &input.code);
        check_password(&mut errors, "new_password", &input.new_password);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        let mut user = uow
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCode)?;
        self.check_code(CodePurpose::PasswordReset, &email, &input.code)
            .await?;

        if self
            .hasher
            .verify(&input.new_password, &user.password_hash)
            .await?
        {
            return Err(AccountError::InvalidInput(
                "new password must differ from the current one",
            ));
        }

        let password_hash = self.hasher.hash(&input.new_password).await?;
        user.replace_password(password_hash, Utc::now());
        uow.update(&user).await?;
        uow.commit().await?;
        self.discard_code(CodePurpose::PasswordReset, &email).await;

        info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
