//! Request/response types for the credential issuance endpoints.
//!
//! The OTP/passkey payloads use camelCase field names and the OAuth payloads
//! use snake_case; both are part of the published wire contract.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendCodeRequest {
    pub phone: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeResponse {
    /// Demo shortcut: the passcode is echoed to the caller instead of being
    /// delivered out-of-band.
    pub code_preview: String,
    pub flow_token: String,
    /// Expiry as epoch milliseconds.
    pub expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub phone: String,
    pub otp: String,
    pub flow_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPasskeyRequest {
    pub phone: String,
    pub credential_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenIngestionRequest {
    pub phone: String,
    pub credential_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Issuance instant as an ISO 8601 string.
    pub issued_at: String,
    pub expires_in: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenRecordResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub credential_id: String,
    pub issued_at: String,
    pub expires_in: i64,
    pub revoked: bool,
    pub revoked_at: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ListTokensQuery {
    #[serde(default)]
    pub phone: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RevokeTokenRequest {
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateApplicationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ApplicationResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateMtpServerRequest {
    pub name: String,
    pub endpoint: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MtpServerResponse {
    pub id: i64,
    pub name: String,
    pub endpoint: String,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}
