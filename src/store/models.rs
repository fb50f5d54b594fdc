use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row, postgres::PgRow};

/// One live OTP challenge per phone; a new issuance replaces the prior row.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub phone: String,
    pub code: String,
    pub flow_token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl<'r> FromRow<'r, PgRow> for OtpChallenge {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            phone: row.try_get("phone")?,
            code: row.try_get("code")?,
            flow_token: row.try_get("flow_token")?,
            expires_at: row.try_get("expires_at")?,
            used: row.try_get("used")?,
        })
    }
}

/// Passkey credential bound to a phone number (at most one, keyed by phone).
#[derive(Debug, Clone)]
pub struct PasskeyBinding {
    pub phone: String,
    pub credential_id: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PasskeyBinding {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            phone: row.try_get("phone")?,
            credential_id: row.try_get("credential_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Issued bearer pair. Rows are append-only; revocation flips `revoked` once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub phone: String,
    pub credential_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_in: i64,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for IssuedToken {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            phone: row.try_get("phone")?,
            credential_id: row.try_get("credential_id")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            issued_at: row.try_get("issued_at")?,
            expires_in: row.try_get("expires_in")?,
            revoked: row.try_get("revoked")?,
            revoked_at: row.try_get("revoked_at")?,
        })
    }
}

/// Registered client application (plain labelled record).
#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ApplicationRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Registered MTP server (plain labelled record).
#[derive(Debug, Clone)]
pub struct MtpServerRecord {
    pub id: i64,
    pub name: String,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for MtpServerRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            endpoint: row.try_get("endpoint")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
