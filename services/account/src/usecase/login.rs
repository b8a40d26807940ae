use passage_token::token::TokenKind;
use tracing::{debug, info};

use crate::domain::repository::{PasswordHasher, TokenIssuer, UserRepository};
use crate::domain::types::{IssuedToken, TokenPair, UserProfile, operation};
use crate::domain::validation::{FieldErrors, check_email, check_password_present, normalize_email};
use crate::error::AccountError;

use super::{AccountPorts, AccountService};

pub struct LoginInput {
    pub email: String,
    pub password: String,
    /// Selects the extended token lifetimes.
    pub remember: bool,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated {
        profile: UserProfile,
        tokens: TokenPair,
    },
    /// Password accepted, second factor pending. `challenge` is a short-lived
    /// `two_factor` token that only the 2FA verification step accepts.
    TwoFactorRequired {
        profile: UserProfile,
        challenge: IssuedToken,
    },
}

impl<P: AccountPorts> AccountService<P> {
    /// Check credentials and issue tokens.
    ///
    /// Unknown email and wrong password fail identically, and an unknown email
    /// still pays for one hash verification against the decoy.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, AccountError> {
        let email = normalize_email(&input.email);
        self.check_rate_limit(operation::LOGIN, &email).await?;

        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        check_password_present(&mut errors, &input.password);
        errors.into_result()?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            let _ = self
                .hasher
                .verify(&input.password, self.hasher.decoy_hash())
                .await;
            debug!("login for unknown email");
            return Err(AccountError::IncorrectCredentials);
        };
        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AccountError::IncorrectCredentials);
        }
        user.ensure_can_authenticate()?;

        if user.is_two_factor_enabled() {
            let challenge = self.tokens.issue(
                user.id,
                TokenKind::TwoFactor,
                self.settings.two_factor_challenge_ttl,
            )?;
            info!(user_id = %user.id, "login awaiting second factor");
            return Ok(LoginOutcome::TwoFactorRequired {
                profile: user.profile(),
                challenge,
            });
        }

        let tokens = self.issue_pair(user.id, input.remember)?;
        info!(user_id = %user.id, remember = input.remember, "user logged in");
        Ok(LoginOutcome::Authenticated {
            profile: user.profile(),
            tokens,
        })
    }
}
