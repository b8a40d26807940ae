use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::repository::{UserRepository, UserUnitOfWork};
use crate::domain::types::{TokenPair, operation};
use crate::domain::validation::{FieldErrors, check_code};
use crate::error::AccountError;
use crate::infra::totp::TotpEnrollment;

use super::{AccountPorts, AccountService};

impl<P: AccountPorts> AccountService<P> {
    /// Generate and stage a TOTP secret. Login is not gated on it until the
    /// first successful [`verify_two_factor`](Self::verify_two_factor).
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn setup_two_factor(&self, user_id: Uuid) -> Result<TotpEnrollment, AccountError> {
        let mut uow = self.users.begin().await?;
        let mut user = uow
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        user.ensure_can_authenticate()?;
        if user.is_two_factor_enabled() {
            return Err(AccountError::BadRequest(
                "two-factor authentication already enabled",
            ));
        }

        let enrollment = self.totp.enroll(&user.email)?;
        user.stage_two_factor(enrollment.secret.clone(), Utc::now())?;
        uow.update(&user).await?;
        uow.commit().await?;

        info!("two-factor secret staged");
        Ok(enrollment)
    }

    /// Check a TOTP code. The first success enables the second factor; every
    /// success issues a token pair. Each code is accepted once.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn verify_two_factor(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<TokenPair, AccountError> {
        self.check_rate_limit(operation::VERIFY_TWO_FACTOR, &user_id.to_string())
            .await?;

        let mut errors = FieldErrors::default();
        check_code(&mut errors, "code", code);
        errors.into_result()?;

        let mut uow = self.users.begin().await?;
        let mut user = uow
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        user.ensure_can_authenticate()?;
        let secret = user
            .two_factor_secret
            .as_deref()
            .ok_or(AccountError::BadRequest(
                "two-factor authentication is not set up",
            ))?;

        let now = Utc::now();
        let unix_secs = u64::try_from(now.timestamp()).unwrap_or_default();
        let Some(step) =
            self.totp
                .matching_step(secret, code, unix_secs, user.two_factor_last_step)?
        else {
            debug!("totp code rejected");
            return Err(AccountError::InvalidInput("invalid code"));
        };

        let newly_enabled = !user.two_factor_enabled;
        user.accept_two_factor_step(step, now);
        uow.update(&user).await?;
        uow.commit().await?;

        if newly_enabled {
            info!("two-factor authentication enabled");
        }
        let tokens = self.issue_pair(user.id, false)?;
        info!("second factor verified");
        Ok(tokens)
    }

    pub async fn disable_two_factor(&self, user_id: Uuid) -> Result<(), AccountError> {
        let mut uow = self.users.begin().await?;
        let mut user = uow
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        user.ensure_can_authenticate()?;
        user.disable_two_factor(Utc::now())?;
        uow.update(&user).await?;
        uow.commit().await?;

        info!(user_id = %user_id, "two-factor authentication disabled");
        Ok(())
    }
}
