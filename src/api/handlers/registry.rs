//! Application and MTP-server registries.
//!
//! Plain append+list records: identity, label fields, creation timestamp,
//! listed newest first. No other invariants.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::error;

use crate::store::CredentialStore;

use super::types::{
    ApplicationResponse, CreateApplicationRequest, CreateMtpServerRequest, MtpServerResponse,
    SuccessResponse,
};

fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Register a client application.
#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application registered", body = SuccessResponse),
        (status = 400, description = "Missing application name", body = String)
    ),
    tag = "registry"
)]
pub async fn create_application(
    store: Extension<Arc<dyn CredentialStore>>,
    payload: Option<Json<CreateApplicationRequest>>,
) -> impl IntoResponse {
    let request: CreateApplicationRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let name = request.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Application name is required.").into_response();
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match store.insert_application(name, description).await {
        Ok(()) => (StatusCode::CREATED, Json(SuccessResponse::ok())).into_response(),
        Err(err) => {
            error!("Failed to insert application: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// List registered applications, newest first.
#[utoipa::path(
    get,
    path = "/api/applications",
    responses(
        (status = 200, description = "Registered applications", body = [ApplicationResponse])
    ),
    tag = "registry"
)]
pub async fn list_applications(store: Extension<Arc<dyn CredentialStore>>) -> impl IntoResponse {
    match store.list_applications().await {
        Ok(rows) => {
            let rows: Vec<ApplicationResponse> = rows
                .into_iter()
                .map(|record| ApplicationResponse {
                    id: record.id,
                    name: record.name,
                    description: record.description,
                    created_at: iso_timestamp(record.created_at),
                })
                .collect();
            Json(rows).into_response()
        }
        Err(err) => {
            error!("Failed to list applications: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Register an MTP server.
#[utoipa::path(
    post,
    path = "/api/mtp-servers",
    request_body = CreateMtpServerRequest,
    responses(
        (status = 201, description = "MTP server registered", body = SuccessResponse),
        (status = 400, description = "Missing name or endpoint", body = String)
    ),
    tag = "registry"
)]
pub async fn create_mtp_server(
    store: Extension<Arc<dyn CredentialStore>>,
    payload: Option<Json<CreateMtpServerRequest>>,
) -> impl IntoResponse {
    let request: CreateMtpServerRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let name = request.name.trim();
    let endpoint = request.endpoint.trim();
    if name.is_empty() || endpoint.is_empty() {
        return (StatusCode::BAD_REQUEST, "Name and endpoint are required.").into_response();
    }

    match store.insert_mtp_server(name, endpoint).await {
        Ok(()) => (StatusCode::CREATED, Json(SuccessResponse::ok())).into_response(),
        Err(err) => {
            error!("Failed to insert MTP server: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// List registered MTP servers, newest first.
#[utoipa::path(
    get,
    path = "/api/mtp-servers",
    responses(
        (status = 200, description = "Registered MTP servers", body = [MtpServerResponse])
    ),
    tag = "registry"
)]
pub async fn list_mtp_servers(store: Extension<Arc<dyn CredentialStore>>) -> impl IntoResponse {
    match store.list_mtp_servers().await {
        Ok(rows) => {
            let rows: Vec<MtpServerResponse> = rows
                .into_iter()
                .map(|record| MtpServerResponse {
                    id: record.id,
                    name: record.name,
                    endpoint: record.endpoint,
                    created_at: iso_timestamp(record.created_at),
                })
                .collect();
            Json(rows).into_response()
        }
        Err(err) => {
            error!("Failed to list MTP servers: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
