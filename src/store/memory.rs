//! In-memory [`CredentialStore`] fake backing the handler test suites.
//!
//! Same observable semantics as the Postgres implementation, minus
//! durability: a mutexed set of vectors/maps stands in for the five tables.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::models::{
    ApplicationRecord, IssuedToken, MtpServerRecord, OtpChallenge, PasskeyBinding,
};
use super::{CredentialStore, RevokeOutcome, VerifyOutcome};

#[derive(Default)]
struct Inner {
    challenges: Vec<OtpChallenge>,
    bindings: HashMap<String, PasskeyBinding>,
    tokens: Vec<IssuedToken>,
    applications: Vec<ApplicationRecord>,
    mtp_servers: Vec<MtpServerRecord>,
    next_registry_id: i64,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn replace_challenge(&self, challenge: OtpChallenge) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.challenges.retain(|row| row.phone != challenge.phone);
        inner.challenges.push(challenge);
        Ok(())
    }

    async fn consume_challenge(
        &self,
        phone: &str,
        code: &str,
        flow_token: &str,
    ) -> Result<VerifyOutcome> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let Some(row) = inner.challenges.iter_mut().find(|row| {
            row.phone == phone && row.code == code && row.flow_token == flow_token && !row.used
        }) else {
            return Ok(VerifyOutcome::NotFound);
        };

        if Utc::now() > row.expires_at {
            return Ok(VerifyOutcome::Expired);
        }

        row.used = true;
        Ok(VerifyOutcome::Verified)
    }

    async fn latest_verified_challenge(&self, phone: &str) -> Result<Option<OtpChallenge>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .challenges
            .iter()
            .filter(|row| row.phone == phone && row.used)
            .max_by_key(|row| row.expires_at)
            .cloned())
    }

    async fn upsert_binding(&self, binding: PasskeyBinding) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.bindings.insert(binding.phone.clone(), binding);
        Ok(())
    }

    async fn find_binding(
        &self,
        phone: &str,
        credential_id: &str,
    ) -> Result<Option<PasskeyBinding>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .bindings
            .get(phone)
            .filter(|binding| binding.credential_id == credential_id)
            .cloned())
    }

    async fn insert_token(&self, token: IssuedToken) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.tokens.push(token);
        Ok(())
    }

    async fn tokens_for_phone(&self, phone: &str) -> Result<Vec<IssuedToken>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        // Append-only log, so reverse insertion order is newest first.
        Ok(inner
            .tokens
            .iter()
            .rev()
            .filter(|token| token.phone == phone)
            .cloned()
            .collect())
    }

    async fn revoke_token(&self, access_token: &str) -> Result<RevokeOutcome> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let Some(row) = inner
            .tokens
            .iter_mut()
            .find(|token| token.access_token == access_token && !token.revoked)
        else {
            return Ok(RevokeOutcome::NotFound);
        };

        row.revoked = true;
        row.revoked_at = Some(Utc::now());
        Ok(RevokeOutcome::Revoked)
    }

    async fn insert_application(&self, name: &str, description: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_registry_id += 1;
        let record = ApplicationRecord {
            id: inner.next_registry_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        inner.applications.push(record);
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.applications.iter().rev().cloned().collect())
    }

    async fn insert_mtp_server(&self, name: &str, endpoint: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_registry_id += 1;
        let record = MtpServerRecord {
            id: inner.next_registry_id,
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            created_at: Utc::now(),
        };
        inner.mtp_servers.push(record);
        Ok(())
    }

    async fn list_mtp_servers(&self) -> Result<Vec<MtpServerRecord>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.mtp_servers.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn challenge(phone: &str, code: &str, flow_token: &str, ttl_seconds: i64) -> OtpChallenge {
        OtpChallenge {
            phone: phone.to_string(),
            code: code.to_string(),
            flow_token: flow_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
            used: false,
        }
    }

    #[tokio::test]
    async fn replace_challenge_supersedes_prior_row() -> Result<()> {
        let store = MemoryStore::new();
        store
            .replace_challenge(challenge("+5511999990000", "111111", "flow-1", 60))
            .await?;
        store
            .replace_challenge(challenge("+5511999990000", "222222", "flow-2", 60))
            .await?;

        let stale = store
            .consume_challenge("+5511999990000", "111111", "flow-1")
            .await?;
        assert_eq!(stale, VerifyOutcome::NotFound);

        let fresh = store
            .consume_challenge("+5511999990000", "222222", "flow-2")
            .await?;
        assert_eq!(fresh, VerifyOutcome::Verified);
        Ok(())
    }

    #[tokio::test]
    async fn consume_challenge_is_single_use() -> Result<()> {
        let store = MemoryStore::new();
        store
            .replace_challenge(challenge("+5511999990000", "123456", "flow", 60))
            .await?;

        let first = store
            .consume_challenge("+5511999990000", "123456", "flow")
            .await?;
        assert_eq!(first, VerifyOutcome::Verified);

        let second = store
            .consume_challenge("+5511999990000", "123456", "flow")
            .await?;
        assert_eq!(second, VerifyOutcome::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn consume_challenge_reports_expiry_and_leaves_row_unused() -> Result<()> {
        let store = MemoryStore::new();
        store
            .replace_challenge(challenge("+5511999990000", "123456", "flow", -1))
            .await?;

        let first = store
            .consume_challenge("+5511999990000", "123456", "flow")
            .await?;
        assert_eq!(first, VerifyOutcome::Expired);

        // Still present and still unused, so it keeps being rejectable.
        let second = store
            .consume_challenge("+5511999990000", "123456", "flow")
            .await?;
        assert_eq!(second, VerifyOutcome::Expired);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_binding_replaces_credential() -> Result<()> {
        let store = MemoryStore::new();
        for credential_id in ["cred-1", "cred-2"] {
            store
                .upsert_binding(PasskeyBinding {
                    phone: "+5511999990000".to_string(),
                    credential_id: credential_id.to_string(),
                    created_at: Utc::now(),
                })
                .await?;
        }

        assert!(
            store
                .find_binding("+5511999990000", "cred-1")
                .await?
                .is_none()
        );
        assert!(
            store
                .find_binding("+5511999990000", "cred-2")
                .await?
                .is_some()
        );
        Ok(())
    }

    #[tokio::test]
    async fn revoke_token_is_single_use() -> Result<()> {
        let store = MemoryStore::new();
        store
            .insert_token(IssuedToken {
                phone: "+5511999990000".to_string(),
                credential_id: "cred-1".to_string(),
                access_token: "atk_test".to_string(),
                refresh_token: "rtk_test".to_string(),
                issued_at: Utc::now(),
                expires_in: 900,
                revoked: false,
                revoked_at: None,
            })
            .await?;

        assert_eq!(store.revoke_token("atk_test").await?, RevokeOutcome::Revoked);
        assert_eq!(
            store.revoke_token("atk_test").await?,
            RevokeOutcome::NotFound
        );

        let tokens = store.tokens_for_phone("+5511999990000").await?;
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].revoked);
        assert!(tokens[0].revoked_at.is_some());
        Ok(())
    }
}
