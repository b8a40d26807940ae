use std::time::Duration;

use passage_account::domain::types::{CodePurpose, NOTIFY_VERIFY_EMAIL, UserStatus};
use passage_account::error::AccountError;
use passage_account::usecase::otp::{ResendOtpInput, VerifyOtpInput};

use crate::helpers::{Harness, TEST_EMAIL};

fn verify(email: &str, code: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        email: email.to_owned(),
        code: code.to_owned(),
    }
}

// ── VerifyOTP ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_activate_user_with_correct_code() {
    let harness = Harness::new();
    harness.seed_pending_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "483920");

    let profile = harness
        .service()
        .verify_otp(verify(TEST_EMAIL, "483920"))
        .await
        .unwrap();

    assert_eq!(profile.status, UserStatus::Active);
    assert!(profile.email_verified);
    assert!(profile.email_verified_at.is_some());
    assert!(
        harness
            .codes
            .code(CodePurpose::EmailVerification, TEST_EMAIL)
            .is_none(),
        "consumed code should be deleted"
    );
}

#[tokio::test]
async fn should_reject_wrong_code_and_keep_user_pending() {
    let harness = Harness::new();
    harness.seed_pending_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "483920");

    let result = harness
        .service()
        .verify_otp(verify(TEST_EMAIL, "000000"))
        .await;

    assert!(
        matches!(result, Err(AccountError::InvalidCode)),
        "expected InvalidCode, got {result:?}"
    );
    assert_eq!(harness.user(TEST_EMAIL).unwrap().status, UserStatus::Pending);
    assert!(
        harness
            .codes
            .code(CodePurpose::EmailVerification, TEST_EMAIL)
            .is_some(),
        "code should survive a mismatch"
    );
}

#[tokio::test(start_paused = true)]
async fn should_reject_expired_code() {
    let harness = Harness::new();
    harness.seed_pending_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "483920");

    tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
    let result = harness
        .service()
        .verify_otp(verify(TEST_EMAIL, "483920"))
        .await;

    assert!(
        matches!(result, Err(AccountError::CodeExpired)),
        "expected CodeExpired, got {result:?}"
    );
    assert_eq!(harness.user(TEST_EMAIL).unwrap().status, UserStatus::Pending);
}

#[tokio::test]
async fn should_treat_unknown_email_as_invalid_code() {
    let harness = Harness::new();

    let result = harness
        .service()
        .verify_otp(verify("ghost@example.com", "483920"))
        .await;

    assert!(
        matches!(result, Err(AccountError::InvalidCode)),
        "expected InvalidCode, got {result:?}"
    );
}

#[tokio::test]
async fn should_refuse_second_verification() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "483920");

    let result = harness
        .service()
        .verify_otp(verify(TEST_EMAIL, "483920"))
        .await;

    assert!(
        matches!(result, Err(AccountError::BadRequest(_))),
        "expected BadRequest, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_malformed_code_before_lookup() {
    let harness = Harness::new();
    harness.seed_pending_user(TEST_EMAIL);

    let result = harness
        .service()
        .verify_otp(verify(TEST_EMAIL, "12ab"))
        .await;

    assert!(
        matches!(result, Err(AccountError::ValidationFailed(_))),
        "expected ValidationFailed, got {result:?}"
    );
}

#[tokio::test]
async fn should_rate_limit_before_validating_code() {
    let harness = Harness::with_rate_limit(1);
    harness.seed_pending_user(TEST_EMAIL);
    let service = harness.service();

    let _ = service.verify_otp(verify(TEST_EMAIL, "000000")).await;
    let result = service.verify_otp(verify(TEST_EMAIL, "not-a-code")).await;

    assert!(
        matches!(result, Err(AccountError::TooManyRequests)),
        "expected TooManyRequests, got {result:?}"
    );
}

// ── ResendOTP ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_code_and_queue_email_on_resend() {
    let harness = Harness::new();
    harness.seed_pending_user(TEST_EMAIL);
    harness
        .codes
        .insert(CodePurpose::EmailVerification, TEST_EMAIL, "483920");

    harness
        .service()
        .resend_otp(ResendOtpInput {
            email: TEST_EMAIL.to_owned(),
        })
        .await
        .unwrap();

    let events = harness.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NOTIFY_VERIFY_EMAIL);
    let code = harness
        .codes
        .code(CodePurpose::EmailVerification, TEST_EMAIL)
        .unwrap();
    assert_eq!(events[0].payload["verification_code"], code.as_str());
}

#[tokio::test]
async fn should_silently_succeed_resend_for_unknown_or_verified_email() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    let service = harness.service();

    for email in ["ghost@example.com", TEST_EMAIL] {
        service
            .resend_otp(ResendOtpInput {
                email: email.to_owned(),
            })
            .await
            .unwrap();
    }

    assert!(harness.events().is_empty());
}

#[tokio::test]
async fn should_rate_limit_resend_per_email() {
    let harness = Harness::with_rate_limit(1);
    harness.seed_pending_user(TEST_EMAIL);
    let service = harness.service();
    let resend = || ResendOtpInput {
        email: TEST_EMAIL.to_owned(),
    };

    service.resend_otp(resend()).await.unwrap();
    let result = service.resend_otp(resend()).await;

    assert!(
        matches!(result, Err(AccountError::TooManyRequests)),
        "expected TooManyRequests, got {result:?}"
    );
    assert_eq!(harness.events().len(), 1);
}
