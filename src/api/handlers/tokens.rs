//! Token ingestion, listing, and revocation endpoints.
//!
//! Issuance is a logging action: the pair is recorded and returned, nothing
//! downstream introspects it. Revocation is the only mutation and is
//! one-way.

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::error;

use crate::store::{CredentialStore, RevokeOutcome, models::IssuedToken};

use super::FlowConfig;
use super::types::{
    ListTokensQuery, RevokeTokenRequest, SuccessResponse, TokenIngestionRequest, TokenPairResponse,
    TokenRecordResponse,
};
use super::utils::{generate_bearer_token, normalize_phone};

fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Issue an `atk_`/`rtk_` bearer pair for a bound passkey.
#[utoipa::path(
    post,
    path = "/oauth/token-ingestion",
    request_body = TokenIngestionRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 400, description = "No passkey binding for this phone/credential", body = String)
    ),
    tag = "oauth"
)]
pub async fn token_ingestion(
    store: Extension<Arc<dyn CredentialStore>>,
    config: Extension<Arc<FlowConfig>>,
    payload: Option<Json<TokenIngestionRequest>>,
) -> impl IntoResponse {
    let request: TokenIngestionRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let phone = normalize_phone(&request.phone);
    let credential_id = request.credential_id.trim().to_string();

    let binding = match store.find_binding(&phone, &credential_id).await {
        Ok(binding) => binding,
        Err(err) => {
            error!("Failed to look up passkey binding: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token ingestion failed".to_string(),
            )
                .into_response();
        }
    };

    if binding.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            "Passkey not found for this phone number.".to_string(),
        )
            .into_response();
    }

    let (access_token, refresh_token) = match (
        generate_bearer_token("atk_"),
        generate_bearer_token("rtk_"),
    ) {
        (Ok(access), Ok(refresh)) => (access, refresh),
        (Err(err), _) | (_, Err(err)) => {
            error!("Failed to generate bearer pair: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token ingestion failed".to_string(),
            )
                .into_response();
        }
    };

    let issued_at = Utc::now();
    let expires_in = config.token_ttl_seconds();

    let record = IssuedToken {
        phone,
        credential_id,
        access_token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        issued_at,
        expires_in,
        revoked: false,
        revoked_at: None,
    };

    match store.insert_token(record).await {
        Ok(()) => Json(TokenPairResponse {
            access_token,
            refresh_token,
            issued_at: iso_timestamp(issued_at),
            expires_in,
        })
        .into_response(),
        Err(err) => {
            error!("Failed to record issued token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token ingestion failed".to_string(),
            )
                .into_response()
        }
    }
}

/// List every token issued for a phone, newest first, revoked ones included.
#[utoipa::path(
    get,
    path = "/api/tokens",
    params(
        ("phone" = String, Query, description = "Phone number the tokens were issued for")
    ),
    responses(
        (status = 200, description = "Issued tokens, newest first", body = [TokenRecordResponse]),
        (status = 400, description = "Missing phone number", body = String)
    ),
    tag = "oauth"
)]
pub async fn list_tokens(
    store: Extension<Arc<dyn CredentialStore>>,
    query: Query<ListTokensQuery>,
) -> impl IntoResponse {
    let phone = normalize_phone(&query.phone);
    if phone.is_empty() {
        return (StatusCode::BAD_REQUEST, "Phone number is required.".to_string()).into_response();
    }

    match store.tokens_for_phone(&phone).await {
        Ok(tokens) => {
            let rows: Vec<TokenRecordResponse> = tokens
                .into_iter()
                .map(|token| TokenRecordResponse {
                    access_token: token.access_token,
                    refresh_token: token.refresh_token,
                    credential_id: token.credential_id,
                    issued_at: iso_timestamp(token.issued_at),
                    expires_in: token.expires_in,
                    revoked: token.revoked,
                    revoked_at: token.revoked_at.map(iso_timestamp),
                })
                .collect();
            Json(rows).into_response()
        }
        Err(err) => {
            error!("Failed to list tokens: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list tokens".to_string(),
            )
                .into_response()
        }
    }
}

/// Revoke an access token. Single-use: a second call returns 404 because an
/// already revoked token is indistinguishable from one never issued.
#[utoipa::path(
    post,
    path = "/oauth/revoke",
    request_body = RevokeTokenRequest,
    responses(
        (status = 200, description = "Token revoked", body = SuccessResponse),
        (status = 400, description = "Missing access token", body = String),
        (status = 404, description = "Token not found or already revoked", body = String)
    ),
    tag = "oauth"
)]
pub async fn revoke_token(
    store: Extension<Arc<dyn CredentialStore>>,
    payload: Option<Json<RevokeTokenRequest>>,
) -> impl IntoResponse {
    let request: RevokeTokenRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let access_token = request.access_token.trim();
    if access_token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "accessToken is required.".to_string(),
        )
            .into_response();
    }

    match store.revoke_token(access_token).await {
        Ok(RevokeOutcome::Revoked) => Json(SuccessResponse::ok()).into_response(),
        Ok(RevokeOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            "Token not found or already revoked.".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to revoke token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Revocation failed".to_string(),
            )
                .into_response()
        }
    }
}
