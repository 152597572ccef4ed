//! SQLite-backed hackathon collection.
//!
//! Records are upserted by natural key; the generated `id` is assigned on the
//! first insert and kept across later upserts and edits. Batch upserts write
//! record by record, so a failure part-way leaves earlier records in place.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::models::{natural_key, Hackathon, HackathonUpdate, ListFilter, NewHackathon};
use crate::normalize::derive_status;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Create a SqlitePool with WAL mode; the database file is created if missing.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    tracing::debug!("database pool created");
    Ok(pool)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hackathons (
    id TEXT PRIMARY KEY,
    natural_key TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    organizer TEXT NOT NULL DEFAULT '',
    registration_deadline TEXT NOT NULL DEFAULT '',
    event_date TEXT NOT NULL DEFAULT '',
    prize_pool TEXT NOT NULL DEFAULT '',
    website_url TEXT NOT NULL DEFAULT '',
    platform TEXT NOT NULL,
    status TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    eligibility TEXT NOT NULL DEFAULT '',
    scraped_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    source TEXT NOT NULL,
    write_seq INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hackathons_write_seq ON hackathons(write_seq);
"#;

const COLUMNS: &str = "id, title, description, organizer, registration_deadline, event_date, \
     prize_pool, website_url, platform, status, tags, eligibility, scraped_at, updated_at, source";

/// Result of upserting one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: Uuid,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, FromRow)]
struct HackathonRow {
    id: String,
    title: String,
    description: String,
    organizer: String,
    registration_deadline: String,
    event_date: String,
    prize_pool: String,
    website_url: String,
    platform: String,
    status: String,
    tags: String,
    eligibility: String,
    scraped_at: String,
    updated_at: String,
    source: String,
}

impl TryFrom<HackathonRow> for Hackathon {
    type Error = DbError;

    fn try_from(row: HackathonRow) -> Result<Self> {
        Ok(Hackathon {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| DbError::Internal(format!("bad id {}: {e}", row.id)))?,
            title: row.title,
            description: row.description,
            organizer: row.organizer,
            registration_deadline: row.registration_deadline,
            event_date: row.event_date,
            prize_pool: row.prize_pool,
            website_url: row.website_url,
            platform: row.platform.parse().map_err(DbError::Internal)?,
            status: row.status.parse().map_err(DbError::Internal)?,
            tags: serde_json::from_str(&row.tags)?,
            eligibility: row.eligibility,
            scraped_at: parse_timestamp(&row.scraped_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            source: row.source,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Internal(format!("bad timestamp {raw}: {e}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct HackathonStore {
    pool: SqlitePool,
}

impl HackathonStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let store = Self::new(create_pool(database_url).await?);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new record, or overwrite the one sharing its natural key.
    #[tracing::instrument(skip(self, record), fields(title = %record.title))]
    pub async fn upsert(&self, record: &NewHackathon) -> Result<UpsertOutcome> {
        let candidate_id = Uuid::new_v4();
        let tags = serde_json::to_string(&record.tags)?;
        let now = Utc::now().to_rfc3339();

        let stored_id: String = sqlx::query_scalar(
            r#"
            INSERT INTO hackathons (
                id, natural_key, title, description, organizer, registration_deadline,
                event_date, prize_pool, website_url, platform, status, tags, eligibility,
                scraped_at, updated_at, source, write_seq
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM hackathons))
            ON CONFLICT(natural_key) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                organizer = excluded.organizer,
                registration_deadline = excluded.registration_deadline,
                event_date = excluded.event_date,
                prize_pool = excluded.prize_pool,
                website_url = excluded.website_url,
                platform = excluded.platform,
                status = excluded.status,
                tags = excluded.tags,
                eligibility = excluded.eligibility,
                scraped_at = excluded.scraped_at,
                updated_at = excluded.updated_at,
                source = excluded.source,
                write_seq = excluded.write_seq
            RETURNING id
            "#,
        )
        .bind(candidate_id.to_string())
        .bind(record.natural_key())
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.organizer)
        .bind(&record.registration_deadline)
        .bind(&record.event_date)
        .bind(&record.prize_pool)
        .bind(&record.website_url)
        .bind(record.platform.as_str())
        .bind(record.status.as_str())
        .bind(tags)
        .bind(&record.eligibility)
        .bind(record.scraped_at.to_rfc3339())
        .bind(now)
        .bind(&record.source)
        .fetch_one(&self.pool)
        .await?;

        let id = Uuid::parse_str(&stored_id)
            .map_err(|e| DbError::Internal(format!("bad id {stored_id}: {e}")))?;
        let created = id == candidate_id;
        tracing::debug!(%id, created, "upserted hackathon");
        Ok(UpsertOutcome { id, created })
    }

    /// Upsert each record in turn. Stops at the first failure; records
    /// already written stay written.
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub async fn upsert_batch(&self, records: &[NewHackathon]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for record in records {
            if self.upsert(record).await?.created {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
        }
        tracing::info!(
            created = outcome.created,
            updated = outcome.updated,
            "stored hackathon batch"
        );
        Ok(outcome)
    }

    /// All matching records, most recently written first.
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<Hackathon>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM hackathons WHERE 1 = 1"));

        if let Some(platform) = filter.platform {
            qb.push(" AND platform = ").push_bind(platform.as_str());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
            qb.push(" AND (");
            for (i, column) in ["title", "description", "organizer", "tags"].iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("LOWER({column}) LIKE "))
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }

        qb.push(" ORDER BY write_seq DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows: Vec<HackathonRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Hackathon::try_from).collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Hackathon>> {
        let row: Option<HackathonRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM hackathons WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Hackathon::try_from).transpose()
    }

    /// Overwrite the editable fields of one record. The natural key follows
    /// the new title/organizer; taking another record's key is a conflict.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: &HackathonUpdate) -> Result<Hackathon> {
        let status = update.status.unwrap_or_else(|| {
            derive_status(
                &update.registration_deadline,
                &update.event_date,
                None,
                Utc::now().date_naive(),
            )
        });
        let tags = serde_json::to_string(&update.tags)?;

        let result = sqlx::query(
            r#"
            UPDATE hackathons SET
                natural_key = ?2,
                title = ?3,
                description = ?4,
                organizer = ?5,
                registration_deadline = ?6,
                event_date = ?7,
                prize_pool = ?8,
                website_url = ?9,
                platform = ?10,
                status = ?11,
                tags = ?12,
                eligibility = ?13,
                updated_at = ?14,
                write_seq = (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM hackathons)
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .bind(natural_key(&update.title, &update.organizer))
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.organizer)
        .bind(&update.registration_deadline)
        .bind(&update.event_date)
        .bind(&update.prize_pool)
        .bind(&update.website_url)
        .bind(update.platform.as_str())
        .bind(status.as_str())
        .bind(tags)
        .bind(&update.eligibility)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict(format!(
                    "another hackathon is already titled {:?} by {:?}",
                    update.title, update.organizer
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("hackathon {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("hackathon {id}")))
    }

    /// Returns whether a record was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hackathons WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hackathons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
