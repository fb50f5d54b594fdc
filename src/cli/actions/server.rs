use crate::api::{self, FlowConfig};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_url: String,
    pub otp_ttl_seconds: i64,
    pub binding_grace_seconds: i64,
    pub token_ttl_seconds: i64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// initialized, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = FlowConfig::new(args.frontend_url)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_binding_grace_seconds(args.binding_grace_seconds)
        .with_token_ttl_seconds(args.token_ttl_seconds);

    api::new(args.port, args.dsn, config).await
}
