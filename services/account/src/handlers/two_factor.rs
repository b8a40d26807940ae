use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::AccountError;
use crate::handlers::TokensResponse;
use crate::handlers::auth::{CurrentUser, TwoFactorSubject};
use crate::state::AppState;
use crate::usecase::AccountPorts;

#[derive(Serialize)]
pub struct SetupTwoFactorResponse {
    pub secret: String,
    pub otpauth_url: String,
    pub qr_code: String,
}

pub async fn setup<P: AccountPorts>(
    State(state): State<AppState<P>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<SetupTwoFactorResponse>, AccountError> {
    let enrollment = state.service.setup_two_factor(user_id).await?;
    Ok(Json(SetupTwoFactorResponse {
        secret: enrollment.secret,
        otpauth_url: enrollment.otpauth_url,
        qr_code: enrollment.qr_code,
    }))
}

#[derive(Deserialize)]
pub struct VerifyTwoFactorRequest {
    pub code: String,
}

pub async fn verify<P: AccountPorts>(
    State(state): State<AppState<P>>,
    TwoFactorSubject(user_id): TwoFactorSubject,
    Json(body): Json<VerifyTwoFactorRequest>,
) -> Result<Json<TokensResponse>, AccountError> {
    let tokens = state
        .service
        .verify_two_factor(user_id, &body.code)
        .await?;
    Ok(Json(tokens.into()))
}

pub async fn disable<P: AccountPorts>(
    State(state): State<AppState<P>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<StatusCode, AccountError> {
    state.service.disable_two_factor(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
