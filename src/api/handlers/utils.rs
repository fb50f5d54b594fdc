//! Passcode/token generators and small input helpers.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{Rng, RngCore, rngs::OsRng};
use uuid::Uuid;

/// Normalize a phone number for storage and lookups.
pub(super) fn normalize_phone(phone: &str) -> String {
    phone.trim().to_string()
}

/// Uniformly random 6-digit passcode, leading zeros preserved.
pub(super) fn generate_otp() -> String {
    let value = OsRng.gen_range(0..1_000_000u32);
    format!("{value:06}")
}

/// Opaque per-challenge correlation value; a fresh one per issuance keeps
/// codes from being replayed across sessions.
pub(super) fn generate_flow_token() -> String {
    Uuid::new_v4().to_string()
}

/// Random bearer token carrying the given prefix (`atk_`/`rtk_`).
pub(super) fn generate_bearer_token(prefix: &str) -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate bearer token")?;
    Ok(format!(
        "{prefix}{}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn normalize_phone_trims_whitespace() {
        assert_eq!(normalize_phone(" +55 11 99999-0000 "), "+55 11 99999-0000");
    }

    #[test]
    fn generate_otp_is_six_zero_padded_digits() {
        for _ in 0..64 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6, "got: {otp}");
            assert!(otp.chars().all(|c| c.is_ascii_digit()), "got: {otp}");
        }
    }

    #[test]
    fn generate_flow_token_is_unique() {
        assert_ne!(generate_flow_token(), generate_flow_token());
    }

    #[test]
    fn generate_bearer_token_round_trip() -> anyhow::Result<()> {
        let token = generate_bearer_token("atk_")?;
        let encoded = token
            .strip_prefix("atk_")
            .ok_or_else(|| anyhow::anyhow!("missing prefix"))?;
        let decoded = URL_SAFE_NO_PAD.decode(encoded.as_bytes())?;
        assert_eq!(decoded.len(), 32);
        Ok(())
    }

    #[test]
    fn generate_bearer_token_distinct_per_call() -> anyhow::Result<()> {
        assert_ne!(generate_bearer_token("atk_")?, generate_bearer_token("atk_")?);
        Ok(())
    }
}
