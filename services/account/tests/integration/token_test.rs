use std::time::Duration;

use passage_token::token::TokenKind;
use uuid::Uuid;

use passage_account::domain::repository::TokenIssuer;
use passage_account::domain::types::UserStatus;
use passage_account::error::AccountError;

use crate::helpers::{Harness, TEST_EMAIL, test_issuer};

fn token(subject: Uuid, kind: TokenKind) -> String {
    test_issuer()
        .issue(subject, kind, Duration::from_secs(60))
        .unwrap()
        .token
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_refresh_with_default_lifetimes() {
    let harness = Harness::new();
    let user = harness.seed_active_user(TEST_EMAIL);

    let pair = harness
        .service()
        .refresh_token(&token(user.id, TokenKind::Refresh))
        .await
        .unwrap();

    let issuer = test_issuer();
    assert_eq!(
        issuer.verify(&pair.access.token, TokenKind::Access).unwrap(),
        user.id
    );
    assert_eq!(
        issuer.verify(&pair.refresh.token, TokenKind::Refresh).unwrap(),
        user.id
    );
    let max_refresh = passage_token::token::now_secs() + harness.settings.refresh_ttl.as_secs();
    assert!(pair.refresh.expires_at <= max_refresh);
}

#[tokio::test]
async fn should_reject_access_token_as_refresh_token() {
    let harness = Harness::new();
    let user = harness.seed_active_user(TEST_EMAIL);

    let result = harness
        .service()
        .refresh_token(&token(user.id, TokenKind::Access))
        .await;

    assert!(
        matches!(result, Err(AccountError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_garbage_refresh_token() {
    let result = Harness::new().service().refresh_token("not-a-jwt").await;
    assert!(
        matches!(result, Err(AccountError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_return_user_not_found_for_deleted_subject() {
    let result = Harness::new()
        .service()
        .refresh_token(&token(Uuid::now_v7(), TokenKind::Refresh))
        .await;

    assert!(
        matches!(result, Err(AccountError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_refuse_refresh_for_inactive_account() {
    let harness = Harness::new();
    let user = harness.seed_active_user(TEST_EMAIL);
    harness.set_status(user.id, UserStatus::Inactive);

    let result = harness
        .service()
        .refresh_token(&token(user.id, TokenKind::Refresh))
        .await;

    assert!(
        matches!(result, Err(AccountError::AccountInactive)),
        "expected AccountInactive, got {result:?}"
    );
}

// ── authenticate ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_authenticate_access_token_only() {
    let service = Harness::new().service();
    let id = Uuid::now_v7();

    assert_eq!(service.authenticate(&token(id, TokenKind::Access)).unwrap(), id);
    for kind in [TokenKind::Refresh, TokenKind::TwoFactor] {
        let result = service.authenticate(&token(id, kind));
        assert!(
            matches!(result, Err(AccountError::InvalidToken)),
            "expected InvalidToken for {kind:?}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_accept_access_or_challenge_for_two_factor() {
    let service = Harness::new().service();
    let id = Uuid::now_v7();

    for kind in [TokenKind::Access, TokenKind::TwoFactor] {
        assert_eq!(service.authenticate_two_factor(&token(id, kind)).unwrap(), id);
    }
    let result = service.authenticate_two_factor(&token(id, TokenKind::Refresh));
    assert!(
        matches!(result, Err(AccountError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_load_profile_by_id() {
    let harness = Harness::new();
    let user = harness.seed_active_user(TEST_EMAIL);
    let service = harness.service();

    assert_eq!(service.profile(user.id).await.unwrap(), user.profile());
    let result = service.profile(Uuid::now_v7()).await;
    assert!(
        matches!(result, Err(AccountError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}
