use super::handlers::{health, otp, passkey, registry, tokens};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(otp::send_code))
        .routes(routes!(otp::verify_code))
        .routes(routes!(passkey::register_passkey))
        .routes(routes!(tokens::token_ingestion))
        .routes(routes!(tokens::list_tokens))
        .routes(routes!(tokens::revoke_token))
        .routes(routes!(
            registry::list_applications,
            registry::create_application
        ))
        .routes(routes!(
            registry::list_mtp_servers,
            registry::create_mtp_server
        ));

    let mut otp_tag = Tag::new("otp");
    otp_tag.description = Some("OTP challenge issuance and verification".to_string());

    let mut passkey_tag = Tag::new("passkey");
    passkey_tag.description = Some("Passkey binding after OTP verification".to_string());

    let mut oauth_tag = Tag::new("oauth");
    oauth_tag.description = Some("Bearer token ingestion, listing and revocation".to_string());

    let mut registry_tag = Tag::new("registry");
    registry_tag.description = Some("Application and MTP server registries".to_string());

    router.get_openapi_mut().tags = Some(vec![otp_tag, passkey_tag, oauth_tag, registry_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "otp"));
        assert!(tags.iter().any(|tag| tag.name == "oauth"));
        assert!(spec.paths.paths.contains_key("/api/send-code"));
        assert!(spec.paths.paths.contains_key("/oauth/token-ingestion"));
        assert!(spec.paths.paths.contains_key("/api/mtp-servers"));
    }
}
