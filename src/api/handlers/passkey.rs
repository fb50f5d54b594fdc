//! Passkey binding endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::error;

use crate::store::{CredentialStore, models::PasskeyBinding};

use super::FlowConfig;
use super::types::{RegisterPasskeyRequest, SuccessResponse};
use super::utils::normalize_phone;

/// Bind a passkey credential to a phone that recently verified an OTP.
///
/// Eligibility is a grace window anchored on the challenge's `expires_at`,
/// not on when verification happened. A challenge verified at second 1 and
/// one verified at second 59 of the 60 s window share the same anchor.
#[utoipa::path(
    post,
    path = "/api/register-passkey",
    request_body = RegisterPasskeyRequest,
    responses(
        (status = 200, description = "Passkey bound to the phone number", body = SuccessResponse),
        (status = 400, description = "Missing fields or no recent verified challenge", body = String)
    ),
    tag = "passkey"
)]
pub async fn register_passkey(
    store: Extension<Arc<dyn CredentialStore>>,
    config: Extension<Arc<FlowConfig>>,
    payload: Option<Json<RegisterPasskeyRequest>>,
) -> impl IntoResponse {
    let request: RegisterPasskeyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = normalize_phone(&request.phone);
    let credential_id = request.credential_id.trim();
    if phone.is_empty() || credential_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Phone and credentialId are required.".to_string(),
        )
            .into_response();
    }

    let challenge = match store.latest_verified_challenge(&phone).await {
        Ok(challenge) => challenge,
        Err(err) => {
            error!("Failed to look up verified challenge: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    let eligible = challenge.is_some_and(|challenge| {
        Utc::now() - challenge.expires_at <= Duration::seconds(config.binding_grace_seconds())
    });
    if !eligible {
        // Missing and stale verifications get the same answer.
        return (
            StatusCode::BAD_REQUEST,
            "Verify the code before registering a passkey.".to_string(),
        )
            .into_response();
    }

    let binding = PasskeyBinding {
        phone,
        credential_id: credential_id.to_string(),
        created_at: Utc::now(),
    };

    match store.upsert_binding(binding).await {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(err) => {
            error!("Failed to upsert passkey binding: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response()
        }
    }
}
