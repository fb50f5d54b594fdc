//! # Vinculo (Credential Issuance Service)
//!
//! `vinculo` walks a phone number through a two-factor onboarding flow and
//! records the credentials it hands out along the way:
//!
//! 1. **OTP challenge** — a 6-digit one-time passcode scoped to the phone
//!    number and an opaque flow token, valid for 60 seconds. Issuing a new
//!    challenge supersedes any previous one for the same phone.
//! 2. **Passkey binding** — once a challenge has been verified, exactly one
//!    passkey credential identifier can be bound per phone (re-registration
//!    replaces the previous credential). Eligibility is a grace window
//!    anchored on the challenge's expiry timestamp, not the verification
//!    time.
//! 3. **Token ingestion** — with a binding in place, the service issues an
//!    `atk_`/`rtk_` bearer token pair and appends it to an issuance log.
//!    Tokens are never deleted; revocation is a one-way flag.
//!
//! Two append+list registries (applications and MTP servers) ride along with
//! no invariants beyond insertion order.
//!
//! > **Warning:** this is a demonstration flow. The OTP is returned on the
//! > issuing channel, no WebAuthn ceremony is verified, and the bearer pair
//! > is an opaque record rather than a guarded grant.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
