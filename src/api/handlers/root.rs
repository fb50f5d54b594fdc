use axum::response::IntoResponse;

// Undocumented banner route; kept out of the OpenAPI spec on purpose.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
