//! PostgreSQL document-store adapter.
//!
//! Claims are stored as JSONB documents keyed by id. `submission_date` and
//! `last_updated_date` live in native `TIMESTAMPTZ` columns and are written back
//! into the document as ISO-8601 strings when a claim is read.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use tracing::info;

use crate::{
    error::{FlowError, Result},
    model::{AppNotification, Claim, NotificationKind},
    storage::{ClaimRepository, NotificationRepository},
};

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS claims (
        id TEXT PRIMARY KEY,
        document JSONB NOT NULL,
        status TEXT NOT NULL,
        submission_date TIMESTAMPTZ NOT NULL,
        last_updated_date TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS notifications (
        seq BIGSERIAL,
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        kind TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        read BOOLEAN NOT NULL DEFAULT FALSE,
        claim_id TEXT
    )"#,
    r#"CREATE INDEX IF NOT EXISTS claims_submission_date_idx ON claims (submission_date DESC)"#,
];

/// Format a store timestamp the way the rest of the system expects it.
pub fn to_iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Open a pool and make sure both tables exist.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }
    info!("PostgreSQL claim store ready");
    Ok(pool)
}

#[derive(Clone)]
pub struct PostgresClaimRepository {
    pool: PgPool,
}

impl PostgresClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(connect(database_url).await?))
    }

    /// Split a claim into its JSONB body and native timestamp columns.
    fn to_document(claim: &Claim) -> Result<Value> {
        let mut document = serde_json::to_value(claim)?;
        if let Value::Object(fields) = &mut document {
            fields.remove("submissionDate");
            fields.remove("lastUpdatedDate");
        }
        Ok(document)
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Claim> {
        let mut document: Value = row.try_get("document")?;
        let submitted: DateTime<Utc> = row.try_get("submission_date")?;
        let updated: DateTime<Utc> = row.try_get("last_updated_date")?;

        let Value::Object(fields) = &mut document else {
            return Err(FlowError::StorageError("claim document is not an object".into()));
        };
        fields.insert("submissionDate".into(), Value::String(to_iso8601(submitted)));
        fields.insert("lastUpdatedDate".into(), Value::String(to_iso8601(updated)));

        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait]
impl ClaimRepository for PostgresClaimRepository {
    async fn save(&self, claim: &Claim) -> Result<()> {
        let document = Self::to_document(claim)?;
        sqlx::query(
            r#"INSERT INTO claims (id, document, status, submission_date, last_updated_date)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (id) DO UPDATE SET
                   document = EXCLUDED.document,
                   status = EXCLUDED.status,
                   last_updated_date = EXCLUDED.last_updated_date"#,
        )
        .bind(&claim.id)
        .bind(document)
        .bind(claim.status.label())
        .bind(claim.submission_date)
        .bind(claim.last_updated_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Claim>> {
        let row = sqlx::query(
            "SELECT document, submission_date, last_updated_date FROM claims WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_ordered_by_date(&self) -> Result<Vec<Claim>> {
        let rows = sqlx::query(
            "SELECT document, submission_date, last_updated_date FROM claims ORDER BY submission_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::from_row).collect()
    }
}

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Info => "info",
        NotificationKind::Success => "success",
        NotificationKind::Warning => "warning",
        NotificationKind::Error => "error",
    }
}

fn parse_kind(label: &str) -> Result<NotificationKind> {
    match label {
        "info" => Ok(NotificationKind::Info),
        "success" => Ok(NotificationKind::Success),
        "warning" => Ok(NotificationKind::Warning),
        "error" => Ok(NotificationKind::Error),
        other => Err(FlowError::StorageError(format!("unknown notification kind: {other}"))),
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn prepend(&self, notification: AppNotification) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO notifications (id, title, message, kind, timestamp, read, claim_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&notification.id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(kind_label(notification.kind))
        .bind(notification.timestamp)
        .bind(notification.read)
        .bind(&notification.claim_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AppNotification>> {
        let rows = sqlx::query(
            "SELECT id, title, message, kind, timestamp, read, claim_id FROM notifications ORDER BY seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<AppNotification> {
                let kind: String = row.try_get("kind")?;
                Ok(AppNotification {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    message: row.try_get("message")?,
                    kind: parse_kind(&kind)?,
                    timestamp: row.try_get("timestamp")?,
                    read: row.try_get("read")?,
                    claim_id: row.try_get("claim_id")?,
                })
            })
            .collect()
    }

    async fn mark_read(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM notifications")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn retain_latest(&self, keep: usize) -> Result<()> {
        sqlx::query(
            "DELETE FROM notifications WHERE seq NOT IN (SELECT seq FROM notifications ORDER BY seq DESC LIMIT $1)",
        )
        .bind(keep as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
