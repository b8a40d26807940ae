use chrono::Utc;
use tracing::info;

use crate::domain::repository::{PasswordHasher, UserRepository, UserUnitOfWork};
use crate::domain::types::{CodePurpose, User, UserProfile, operation};
use crate::domain::validation::{
    FieldErrors, check_email, check_name, check_password, normalize_email,
};
use crate::error::AccountError;

use super::{AccountPorts, AccountService};

pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl<P: AccountPorts> AccountService<P> {
    /// Create a `pending` account and email it a verification code.
    ///
    /// The user row, the code and the outbox row are written in one unit of
    /// work; a duplicate email (including a concurrent registration caught by
    /// the unique index) fails with `Conflict`.
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, input: RegisterInput) -> Result<UserProfile, AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::REGISTER, &email).await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        check_name(&mut errors, &input.name);
        check_password(&mut errors, "password", &input.password);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        if uow.find_by_email(&email).await?.is_some() {
            return Err(AccountError::Conflict);
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        let user = User::register(
            email,
            input.name.trim().to_owned(),
            password_hash,
            Utc::now(),
        );
        uow.create(&user).await?;
        self.send_code(&mut uow, &user, CodePurpose::EmailVerification)
            .await?;
        uow.commit().await?;

        info!(user_id = %user.id, "user registered");
        Ok(user.profile())
    }
}
