//! API handlers for the credential issuance flow.
//!
//! Per-phone lifecycle: `NoChallenge → ChallengeIssued → ChallengeVerified →
//! BoundPasskey → TokenIssued(s)`, with each issued token independently
//! moving `Active → Revoked`. A new challenge never resets bindings or
//! previously issued tokens.
//!
//! Handlers parse inputs, apply the flow windows from [`FlowConfig`], and map
//! store outcomes to HTTP statuses. All persistence goes through the injected
//! [`crate::store::CredentialStore`].

pub mod health;
pub mod otp;
pub mod passkey;
pub mod registry;
pub mod root;
pub mod tokens;
pub mod types;
mod utils;


const DEFAULT_OTP_TTL_SECONDS: i64 = 60;
const DEFAULT_BINDING_GRACE_SECONDS: i64 = 5 * 60;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 15 * 60;

/// Flow windows and the allowed frontend origin.
///
/// The defaults are the published contract (60 s codes, 5 min binding grace,
/// 900 s token lifetime); the CLI can override them for local testing.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    frontend_url: String,
    otp_ttl_seconds: i64,
    binding_grace_seconds: i64,
    token_ttl_seconds: i64,
}

impl FlowConfig {
    #[must_use]
    pub fn new(frontend_url: String) -> Self {
        Self {
            frontend_url,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            binding_grace_seconds: DEFAULT_BINDING_GRACE_SECONDS,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_binding_grace_seconds(mut self, seconds: i64) -> Self {
        self.binding_grace_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub(super) fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    pub(super) fn binding_grace_seconds(&self) -> i64 {
        self.binding_grace_seconds
    }

    pub(super) fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}
