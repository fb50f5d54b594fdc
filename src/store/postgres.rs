//! Postgres-backed [`CredentialStore`] plus the versioned schema runner.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::Instrument;

use super::models::{
    ApplicationRecord, IssuedToken, MtpServerRecord, OtpChallenge, PasskeyBinding,
};
use super::{CredentialStore, RevokeOutcome, VerifyOutcome};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));
const SCHEMA_VERSION: i64 = 1;

/// Applies `sql/schema.sql` exactly once, tracked in `schema_migrations`.
///
/// Runs before the listener binds so the service never accepts requests
/// against a partially created schema.
///
/// # Errors
/// Returns an error if a schema statement or the version bookkeeping fails.
pub async fn initialize_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version BIGINT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await
    .context("failed to create schema_migrations table")?;

    let applied = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = $1")
        .bind(SCHEMA_VERSION)
        .fetch_optional(pool)
        .await
        .context("failed to read schema version")?;

    if applied.is_some() {
        return Ok(());
    }

    let mut tx = pool.begin().await.context("begin schema transaction")?;

    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    sqlx::query("INSERT INTO schema_migrations (version) VALUES ($1) ON CONFLICT (version) DO NOTHING")
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await
        .context("failed to record schema version")?;

    tx.commit().await.context("commit schema transaction")?;

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn ping(&self) -> Result<()> {
        use sqlx::Connection;

        let acquire_span = tracing::info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span =
            tracing::info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }

    async fn replace_challenge(&self, challenge: OtpChallenge) -> Result<()> {
        // One transaction so the phone never observably has zero or two rows.
        let mut tx = self.pool.begin().await.context("begin challenge transaction")?;

        let query = "DELETE FROM otp_challenges WHERE phone = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&challenge.phone)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete prior challenge")?;

        let query = r"
            INSERT INTO otp_challenges (phone, code, flow_token, expires_at, used)
            VALUES ($1, $2, $3, $4, $5)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&challenge.phone)
            .bind(&challenge.code)
            .bind(&challenge.flow_token)
            .bind(challenge.expires_at)
            .bind(challenge.used)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to insert challenge")?;

        tx.commit().await.context("commit challenge transaction")?;

        Ok(())
    }

    async fn consume_challenge(
        &self,
        phone: &str,
        code: &str,
        flow_token: &str,
    ) -> Result<VerifyOutcome> {
        let mut tx = self.pool.begin().await.context("begin verify transaction")?;

        let query = r"
            SELECT expires_at
            FROM otp_challenges
            WHERE phone = $1 AND code = $2 AND flow_token = $3 AND used = FALSE
            LIMIT 1
            FOR UPDATE
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query_as::<_, (chrono::DateTime<Utc>,)>(query)
            .bind(phone)
            .bind(code)
            .bind(flow_token)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lookup challenge")?;

        let Some((expires_at,)) = row else {
            let _ = tx.rollback().await;
            return Ok(VerifyOutcome::NotFound);
        };

        if Utc::now() > expires_at {
            // The row stays unused: still rejectable, never approvable later.
            let _ = tx.rollback().await;
            return Ok(VerifyOutcome::Expired);
        }

        let query = "UPDATE otp_challenges SET used = TRUE WHERE phone = $1 AND flow_token = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(phone)
            .bind(flow_token)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to mark challenge used")?;

        tx.commit().await.context("commit verify transaction")?;

        Ok(VerifyOutcome::Verified)
    }

    async fn latest_verified_challenge(&self, phone: &str) -> Result<Option<OtpChallenge>> {
        let query = r"
            SELECT phone, code, flow_token, expires_at, used
            FROM otp_challenges
            WHERE phone = $1 AND used = TRUE
            ORDER BY expires_at DESC
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, OtpChallenge>(query)
            .bind(phone)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch verified challenge")
    }

    async fn upsert_binding(&self, binding: PasskeyBinding) -> Result<()> {
        let query = r"
            INSERT INTO passkey_bindings (phone, credential_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone) DO UPDATE
            SET credential_id = EXCLUDED.credential_id,
                created_at = EXCLUDED.created_at
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&binding.phone)
            .bind(&binding.credential_id)
            .bind(binding.created_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to upsert passkey binding")?;

        Ok(())
    }

    async fn find_binding(
        &self,
        phone: &str,
        credential_id: &str,
    ) -> Result<Option<PasskeyBinding>> {
        let query = r"
            SELECT phone, credential_id, created_at
            FROM passkey_bindings
            WHERE phone = $1 AND credential_id = $2
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, PasskeyBinding>(query)
            .bind(phone)
            .bind(credential_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch passkey binding")
    }

    async fn insert_token(&self, token: IssuedToken) -> Result<()> {
        let query = r"
            INSERT INTO oauth_tokens
                (phone, credential_id, access_token, refresh_token, issued_at, expires_in, revoked, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&token.phone)
            .bind(&token.credential_id)
            .bind(&token.access_token)
            .bind(&token.refresh_token)
            .bind(token.issued_at)
            .bind(token.expires_in)
            .bind(token.revoked)
            .bind(token.revoked_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert token")?;

        Ok(())
    }

    async fn tokens_for_phone(&self, phone: &str) -> Result<Vec<IssuedToken>> {
        let query = r"
            SELECT phone, credential_id, access_token, refresh_token,
                   issued_at, expires_in, revoked, revoked_at
            FROM oauth_tokens
            WHERE phone = $1
            ORDER BY issued_at DESC, id DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, IssuedToken>(query)
            .bind(phone)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list tokens")
    }

    async fn revoke_token(&self, access_token: &str) -> Result<RevokeOutcome> {
        let query = r"
            UPDATE oauth_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE access_token = $1 AND revoked = FALSE
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(access_token)
            .bind(Utc::now())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to revoke token")?;

        if result.rows_affected() > 0 {
            Ok(RevokeOutcome::Revoked)
        } else {
            Ok(RevokeOutcome::NotFound)
        }
    }

    async fn insert_application(&self, name: &str, description: Option<&str>) -> Result<()> {
        let query = "INSERT INTO applications (name, description) VALUES ($1, $2)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert application")?;

        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>> {
        let query = r"
            SELECT id, name, description, created_at
            FROM applications
            ORDER BY created_at DESC, id DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, ApplicationRecord>(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list applications")
    }

    async fn insert_mtp_server(&self, name: &str, endpoint: &str) -> Result<()> {
        let query = "INSERT INTO mtp_servers (name, endpoint) VALUES ($1, $2)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(name)
            .bind(endpoint)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert MTP server")?;

        Ok(())
    }

    async fn list_mtp_servers(&self) -> Result<Vec<MtpServerRecord>> {
        let query = r"
            SELECT id, name, endpoint, created_at
            FROM mtp_servers
            ORDER BY created_at DESC, id DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, MtpServerRecord>(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list MTP servers")
    }
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_SQL, split_sql_statements};

    #[test]
    fn schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert!(
            statements.len() >= 5,
            "expected one statement per table at minimum, got {}",
            statements.len()
        );
        assert!(statements.iter().all(|s| s.ends_with(';')));
    }

    #[test]
    fn split_skips_comment_lines() {
        let statements = split_sql_statements("-- only a comment\nSELECT 1;\n");
        assert_eq!(statements, vec!["SELECT 1;".to_string()]);
    }

    #[test]
    fn split_keeps_trailing_statement_without_semicolon() {
        let statements = split_sql_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "SELECT 2");
    }
}
