use passage_account::domain::types::{CodePurpose, NOTIFY_FORGOT_PASSWORD};
use passage_account::error::AccountError;
use passage_account::usecase::password::{ForgotPasswordInput, ResetPasswordInput};

use crate::helpers::{Harness, TEST_EMAIL, TEST_PASSWORD, mock_hash};

const NEW_PASSWORD: &str = "Wxyz98#$";

fn reset(code: &str, new_password: &str) -> ResetPasswordInput {
    ResetPasswordInput {
        email: TEST_EMAIL.to_owned(),
        code: code.to_owned(),
        new_password: new_password.to_owned(),
    }
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_reset_code_and_queue_email() {
    let harness = Harness::new();
    let user = harness.seed_active_user(TEST_EMAIL);

    harness
        .service()
        .forgot_password(ForgotPasswordInput {
            email: TEST_EMAIL.to_owned(),
        })
        .await
        .unwrap();

    let code = harness
        .codes
        .code(CodePurpose::PasswordReset, TEST_EMAIL)
        .expect("reset code stored");
    let events = harness.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NOTIFY_FORGOT_PASSWORD);
    assert_eq!(events[0].payload["user_id"], user.id.to_string());
    assert_eq!(events[0].payload["verification_code"], code.as_str());
}

#[tokio::test]
async fn should_not_reveal_unknown_email() {
    let harness = Harness::new();

    let result = harness
        .service()
        .forgot_password(ForgotPasswordInput {
            email: "ghost@example.com".to_owned(),
        })
        .await;

    assert!(result.is_ok(), "expected Ok, got {result:?}");
    assert!(harness.events().is_empty());
    assert!(
        harness
            .codes
            .code(CodePurpose::PasswordReset, "ghost@example.com")
            .is_none()
    );
}

#[tokio::test]
async fn should_rate_limit_forgot_password_per_email() {
    let harness = Harness::with_rate_limit(1);
    harness.seed_active_user(TEST_EMAIL);
    let service = harness.service();
    let forgot = || ForgotPasswordInput {
        email: TEST_EMAIL.to_owned(),
    };

    service.forgot_password(forgot()).await.unwrap();
    let result = service.forgot_password(forgot()).await;

    assert!(
        matches!(result, Err(AccountError::TooManyRequests)),
        "expected TooManyRequests, got {result:?}"
    );
    assert_eq!(harness.events().len(), 1);
}

// ── ResetPassword ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_password_with_valid_code() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::PasswordReset, TEST_EMAIL, "271828");

    harness
        .service()
        .reset_password(reset("271828", NEW_PASSWORD))
        .await
        .unwrap();

    assert_eq!(
        harness.user(TEST_EMAIL).unwrap().password_hash,
        mock_hash(NEW_PASSWORD)
    );
    assert!(
        harness
            .codes
            .code(CodePurpose::PasswordReset, TEST_EMAIL)
            .is_none()
    );
}

#[tokio::test]
async fn should_not_accept_verification_code_for_reset() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "271828");

    let result = harness
        .service()
        .reset_password(reset("271828", NEW_PASSWORD))
        .await;

    assert!(
        matches!(result, Err(AccountError::CodeExpired)),
        "expected CodeExpired, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_wrong_reset_code() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::PasswordReset, TEST_EMAIL, "271828");

    let result = harness
        .service()
        .reset_password(reset("314159", NEW_PASSWORD))
        .await;

    assert!(
        matches!(result, Err(AccountError::InvalidCode)),
        "expected InvalidCode, got {result:?}"
    );
    assert_eq!(
        harness.user(TEST_EMAIL).unwrap().password_hash,
        mock_hash(TEST_PASSWORD)
    );
}

#[tokio::test]
async fn should_reject_reusing_current_password() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::PasswordReset, TEST_EMAIL, "271828");

    let result = harness
        .service()
        .reset_password(reset("271828", TEST_PASSWORD))
        .await;

    assert!(
        matches!(result, Err(AccountError::InvalidInput(_))),
        "expected InvalidInput, got {result:?}"
    );
}

#[tokio::test]
async fn should_validate_new_password_complexity() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);

    let result = harness
        .service()
        .reset_password(reset("271828", "password"))
        .await;

    let Err(AccountError::ValidationFailed(errors)) = result else {
        panic!("expected ValidationFailed, got {result:?}");
    };
    assert_eq!(errors.iter().next().unwrap().field, "new_password");
}

#[tokio::test]
async fn should_not_accept_consumed_reset_code() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::PasswordReset, TEST_EMAIL, "271828");
    let service = harness.service();

    service
        .reset_password(reset("271828", NEW_PASSWORD))
        .await
        .unwrap();
    let again = service.reset_password(reset("271828", "Other12!@")).await;

    assert!(
        matches!(again, Err(AccountError::CodeExpired)),
        "expected CodeExpired, got {again:?}"
    );
}

#[tokio::test]
async fn should_rate_limit_reset_before_validation() {
    let harness = Harness::with_rate_limit(1);
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::PasswordReset, TEST_EMAIL, "271828");
    let service = harness.service();

    let _ = service.reset_password(reset("314159", NEW_PASSWORD)).await;
    let result = service.reset_password(reset("271828", "weak")).await;

    assert!(
        matches!(result, Err(AccountError::TooManyRequests)),
        "expected TooManyRequests, got {result:?}"
    );
    assert_eq!(
        harness.user(TEST_EMAIL).unwrap().password_hash,
        mock_hash(TEST_PASSWORD)
    );
}
