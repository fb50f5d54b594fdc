//! OTP challenge endpoints: issue a code, verify a code.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::error;

use crate::store::{CredentialStore, VerifyOutcome, models::OtpChallenge};

use super::FlowConfig;
use super::types::{SendCodeRequest, SendCodeResponse, SuccessResponse, VerifyCodeRequest};
use super::utils::{generate_flow_token, generate_otp, normalize_phone};

/// Issue a fresh OTP challenge for a phone number, superseding any prior one.
#[utoipa::path(
    post,
    path = "/api/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Challenge issued", body = SendCodeResponse),
        (status = 400, description = "Missing phone number", body = String)
    ),
    tag = "otp"
)]
pub async fn send_code(
    store: Extension<Arc<dyn CredentialStore>>,
    config: Extension<Arc<FlowConfig>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let request: SendCodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = normalize_phone(&request.phone);
    if phone.is_empty() {
        return (StatusCode::BAD_REQUEST, "Phone number is required.".to_string()).into_response();
    }

    let code = generate_otp();
    let flow_token = generate_flow_token();
    let expires_at = Utc::now() + Duration::seconds(config.otp_ttl_seconds());

    let challenge = OtpChallenge {
        phone,
        code: code.clone(),
        flow_token: flow_token.clone(),
        expires_at,
        used: false,
    };

    if let Err(err) = store.replace_challenge(challenge).await {
        error!("Failed to store OTP challenge: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue code".to_string(),
        )
            .into_response();
    }

    // The code rides back on the issuing channel: demo shortcut, kept as part
    // of the published contract.
    Json(SendCodeResponse {
        code_preview: code,
        flow_token,
        expires_at: expires_at.timestamp_millis(),
    })
    .into_response()
}

/// Verify an OTP challenge. Success is terminal for the row: a repeat call
/// with identical arguments fails because `used` has flipped.
#[utoipa::path(
    post,
    path = "/api/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code verified", body = SuccessResponse),
        (status = 400, description = "Invalid, already used, or expired code", body = String)
    ),
    tag = "otp"
)]
pub async fn verify_code(
    store: Extension<Arc<dyn CredentialStore>>,
    payload: Option<Json<VerifyCodeRequest>>,
) -> impl IntoResponse {
    let request: VerifyCodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = normalize_phone(&request.phone);
    let outcome = store
        .consume_challenge(&phone, request.otp.trim(), request.flow_token.trim())
        .await;

    match outcome {
        Ok(VerifyOutcome::Verified) => Json(SuccessResponse::ok()).into_response(),
        // Wrong, reused, and absent challenges get the same answer so callers
        // cannot probe which one it was.
        Ok(VerifyOutcome::NotFound) => (
            StatusCode::BAD_REQUEST,
            "Invalid or already used code.".to_string(),
        )
            .into_response(),
        Ok(VerifyOutcome::Expired) => {
            (StatusCode::BAD_REQUEST, "Code expired.".to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to verify OTP challenge: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}
