//! Field rules for account requests. Every violated field is reported, not
//! just the first.

use serde::Serialize;
use validator::ValidateEmail;

use crate::error::AccountError;

pub const EMAIL_MAX_LEN: usize = 255;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was pushed.
    pub fn into_result(self) -> Result<(), AccountError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AccountError::ValidationFailed(self))
        }
    }
}

/// Trim and lowercase. Applied before every lookup, key and write.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.push("email", "is required");
    } else if email.len() > EMAIL_MAX_LEN {
        errors.push("email", "must be at most 255 characters");
    } else if !email.validate_email() {
        errors.push("email", "must be a valid email address");
    }
}

pub fn check_name(errors: &mut FieldErrors, name: &str) {
    let len = name.trim().chars().count();
    if len < NAME_MIN_LEN {
        errors.push("name", "must be at least 2 characters");
    } else if len > NAME_MAX_LEN {
        errors.push("name", "must be at most 100 characters");
    }
}

/// Length bounds plus one each of lowercase, uppercase, digit and symbol.
pub fn check_password(errors: &mut FieldErrors, field: &'static str, password: &str) {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        errors.push(field, "must be at least 8 characters");
        return;
    }
    if len > PASSWORD_MAX_LEN {
        errors.push(field, "must be at most 128 characters");
        return;
    }
    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()));
    if !(has_lower && has_upper && has_digit && has_symbol) {
        errors.push(
            field,
            "must contain a lowercase letter, an uppercase letter, a digit and a symbol",
        );
    }
}

/// Login only checks presence: complexity rules may have changed since the
/// password was set.
pub fn check_password_present(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.push("password", "is required");
    }
}

pub fn check_code(errors: &mut FieldErrors, field: &'static str, code: &str) {
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        errors.push(field, "must be exactly 6 digits");
    }
}
