//! Persistence seam for the credential issuance flow.
//!
//! Handlers depend on the [`CredentialStore`] trait rather than a concrete
//! database handle, so the HTTP surface can be exercised against the
//! in-memory fake while production runs on [`postgres::PgStore`].
//!
//! The trait is deliberately a thin CRUD surface over the five record sets;
//! flow decisions (grace windows, status mapping) stay in the handlers.

pub mod models;
pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use anyhow::Result;
use async_trait::async_trait;

use self::models::{ApplicationRecord, IssuedToken, MtpServerRecord, OtpChallenge, PasskeyBinding};

/// Result of attempting to consume an OTP challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Challenge matched and was marked used.
    Verified,
    /// No unused row matched phone + code + flow token. Wrong, reused, and
    /// absent challenges are indistinguishable on purpose.
    NotFound,
    /// A matching row exists but its expiry has passed; it stays unused.
    Expired,
}

/// Result of attempting to revoke an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Token was active and is now flagged revoked.
    Revoked,
    /// No active row for that access token (never issued or already revoked).
    NotFound,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store connectivity probe for `/health`.
    async fn ping(&self) -> Result<()>;

    /// Atomically deletes any prior challenge for the phone and stores the
    /// new one. No visible gap: readers see either the old or the new row.
    async fn replace_challenge(&self, challenge: OtpChallenge) -> Result<()>;

    /// Looks up the unused challenge matching all three fields and marks it
    /// used. Expired rows are reported but left unused, so they stay
    /// rejectable without becoming approvable later.
    async fn consume_challenge(
        &self,
        phone: &str,
        code: &str,
        flow_token: &str,
    ) -> Result<VerifyOutcome>;

    /// The used challenge for the phone with the latest expiry, if any.
    async fn latest_verified_challenge(&self, phone: &str) -> Result<Option<OtpChallenge>>;

    /// Inserts or replaces the binding keyed by phone.
    async fn upsert_binding(&self, binding: PasskeyBinding) -> Result<()>;

    /// Binding matching phone and credential id exactly, if any.
    async fn find_binding(&self, phone: &str, credential_id: &str)
    -> Result<Option<PasskeyBinding>>;

    /// Appends a row to the issuance log.
    async fn insert_token(&self, token: IssuedToken) -> Result<()>;

    /// All tokens for the phone, newest first, revoked ones included.
    async fn tokens_for_phone(&self, phone: &str) -> Result<Vec<IssuedToken>>;

    /// Flags the active token row as revoked. One-way and single-use: a
    /// second call for the same access token reports `NotFound`.
    async fn revoke_token(&self, access_token: &str) -> Result<RevokeOutcome>;

    async fn insert_application(&self, name: &str, description: Option<&str>) -> Result<()>;

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>>;

    async fn insert_mtp_server(&self, name: &str, endpoint: &str) -> Result<()>;

    async fn list_mtp_servers(&self) -> Result<Vec<MtpServerRecord>>;
}

#[cfg(test)]
mod tests {
    use super::{RevokeOutcome, VerifyOutcome};

    #[test]
    fn verify_outcome_debug_names() {
        assert_eq!(format!("{:?}", VerifyOutcome::Verified), "Verified");
        assert_eq!(format!("{:?}", VerifyOutcome::NotFound), "NotFound");
        assert_eq!(format!("{:?}", VerifyOutcome::Expired), "Expired");
    }

    #[test]
    fn revoke_outcome_debug_names() {
        assert_eq!(format!("{:?}", RevokeOutcome::Revoked), "Revoked");
        assert_eq!(format!("{:?}", RevokeOutcome::NotFound), "NotFound");
    }
}
