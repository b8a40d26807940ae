use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::types::UserProfile;
use crate::error::AccountError;
use crate::handlers::TokensResponse;
use crate::handlers::auth::CurrentUser;
use crate::state::AppState;
use crate::usecase::AccountPorts;
use crate::usecase::login::{LoginInput, LoginOutcome};
use crate::usecase::otp::{ResendOtpInput, VerifyOtpInput};
use crate::usecase::password::{ForgotPasswordInput, ResetPasswordInput};
use crate::usecase::register::RegisterInput;

// ── POST /auth/register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

pub async fn register<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AccountError> {
    let profile = state
        .service
        .register(RegisterInput {
            email: body.email,
            name: body.name,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

// ── POST /auth/login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub two_factor_required: bool,
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: Option<TokensResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_token_expires_at: Option<u64>,
}

pub async fn login<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AccountError> {
    let outcome = state
        .service
        .login(LoginInput {
            email: body.email,
            password: body.password,
            remember: body.remember,
        })
        .await?;

    let response = match outcome {
        LoginOutcome::Authenticated { profile, tokens } => LoginResponse {
            two_factor_required: false,
            user: profile,
            tokens: Some(tokens.into()),
            challenge_token: None,
            challenge_token_expires_at: None,
        },
        LoginOutcome::TwoFactorRequired { profile, challenge } => LoginResponse {
            two_factor_required: true,
            user: profile,
            tokens: None,
            challenge_token: Some(challenge.token),
            challenge_token_expires_at: Some(challenge.expires_at),
        },
    };
    Ok(Json(response))
}

// ── POST /auth/otp/verify, /auth/otp/resend ───────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

pub async fn verify_otp<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<UserProfile>, AccountError> {
    let profile = state
        .service
        .verify_otp(VerifyOtpInput {
            email: body.email,
            code: body.code,
        })
        .await?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub async fn resend_otp<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<EmailRequest>,
) -> Result<StatusCode, AccountError> {
    state
        .service
        .resend_otp(ResendOtpInput { email: body.email })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /auth/token/refresh ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

pub async fn refresh_token<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<TokensResponse>, AccountError> {
    let tokens = state.service.refresh_token(&body.refresh_token).await?;
    Ok(Json(tokens.into()))
}

// ── POST /auth/password/forgot, /auth/password/reset ──────────────────────────

pub async fn forgot_password<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<EmailRequest>,
) -> Result<StatusCode, AccountError> {
    state
        .service
        .forgot_password(ForgotPasswordInput { email: body.email })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password<P: AccountPorts>(
    State(state): State<AppState<P>>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AccountError> {
    state
        .service
        .reset_password(ResetPasswordInput {
            email: body.email,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /auth/me ──────────────────────────────────────────────────────────────

pub async fn me<P: AccountPorts>(
    State(state): State<AppState<P>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserProfile>, AccountError> {
    Ok(Json(state.service.profile(user_id).await?))
}
