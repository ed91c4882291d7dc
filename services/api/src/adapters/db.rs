//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! A text and its contributions live in two tables joined by a foreign key; the
//! adapter loads them together so the core only ever sees whole aggregates, and
//! writes contributions one row at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use text_review_core::domain::{Contribution, Identity, Text, User, UserCredentials, UserSummary};
use text_review_core::ports::{DatabaseService, PortError, PortResult, TextScope};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn contributions_for(
        &self,
        text_ids: &[Uuid],
    ) -> PortResult<HashMap<Uuid, Vec<Contribution>>> {
        let records = sqlx::query_as::<_, ContributionRecord>(
            "SELECT id, text_id, user_id, suggestion, created_at FROM contributions \
             WHERE text_id = ANY($1) ORDER BY seq ASC",
        )
        .bind(text_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut grouped: HashMap<Uuid, Vec<Contribution>> = HashMap::new();
        for record in records {
            grouped.entry(record.text_id).or_default().push(record.to_domain());
        }
        Ok(grouped)
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    username: String,
    email: String,
}

#[derive(FromRow)]
struct IdentityRecord {
    user_id: Uuid,
    is_admin: bool,
}

#[derive(FromRow)]
struct TextRecord {
    id: Uuid,
    user_id: Uuid,
    user_text: String,
    corrected_text: Option<String>,
    corrected_text_vi: Option<String>,
    corrected_by: Option<String>,
    correction_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl TextRecord {
    fn to_domain(self, contributions: Vec<Contribution>) -> Text {
        Text {
            id: self.id,
            user_id: self.user_id,
            user_text: self.user_text,
            corrected_text: self.corrected_text,
            corrected_text_vi: self.corrected_text_vi,
            corrected_by: self.corrected_by,
            correction_date: self.correction_date,
            contributions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ContributionRecord {
    id: Uuid,
    text_id: Uuid,
    user_id: Uuid,
    suggestion: String,
    created_at: DateTime<Utc>,
}
impl ContributionRecord {
    fn to_domain(self) -> Contribution {
        Contribution {
            id: self.id,
            user_id: self.user_id,
            suggestion: self.suggestion,
            created_at: self.created_at,
        }
    }
}

const TEXT_COLUMNS: &str = "id, user_id, user_text, corrected_text, corrected_text_vi, \
     corrected_by, correction_date, created_at, updated_at";

//=========================================================================================
// Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

/// LIMIT/OFFSET are BIGINT in Postgres.
fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn owner_filter(scope: TextScope) -> Option<Uuid> {
    match scope {
        TextScope::All => None,
        TextScope::OwnedBy(user_id) => Some(user_id),
    }
}

/// `ILIKE` pattern matching `keyword` anywhere, with wildcards escaped.
fn contains_pattern(keyword: Option<&str>) -> Option<String> {
    keyword.map(|k| {
        let escaped = k.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

async fn insert_contributions(
    tx: &mut Transaction<'_, Postgres>,
    text_id: Uuid,
    contributions: &[Contribution],
) -> Result<(), sqlx::Error> {
    // Rows are inserted in sequence order, so `seq` mirrors insertion order.
    for contribution in contributions {
        sqlx::query(
            "INSERT INTO contributions (id, text_id, user_id, suggestion, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(contribution.id)
        .bind(text_id)
        .bind(contribution.user_id)
        .bind(&contribution.suggestion)
        .bind(contribution.created_at)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, is_admin, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Email {} is already registered", email))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))?;

        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_summaries(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserSummary>> {
        let records = sqlx::query_as::<_, SummaryRecord>(
            "SELECT id, username, email FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| UserSummary { id: r.id, username: r.username, email: r.email })
            .collect())
    }

    async fn list_users(
        &self,
        keyword: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, is_admin, created_at FROM users \
             WHERE ($1::text IS NULL OR username ILIKE $1 OR email ILIKE $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(contains_pattern(keyword))
        .bind(to_bigint(limit))
        .bind(to_bigint(skip))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_users(&self, keyword: Option<&str>) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::text IS NULL OR username ILIKE $1 OR email ILIKE $1)",
        )
        .bind(contains_pattern(keyword))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "SELECT u.id AS user_id, u.is_admin FROM auth_sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;

        Ok(Identity { user_id: record.user_id, is_admin: record.is_admin })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn find_texts(&self, scope: TextScope, skip: u64, limit: u64) -> PortResult<Vec<Text>> {
        let records = sqlx::query_as::<_, TextRecord>(&format!(
            "SELECT {} FROM texts WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            TEXT_COLUMNS
        ))
        .bind(owner_filter(scope))
        .bind(to_bigint(limit))
        .bind(to_bigint(skip))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut contributions = self.contributions_for(&ids).await?;

        Ok(records
            .into_iter()
            .map(|r| {
                let list = contributions.remove(&r.id).unwrap_or_default();
                r.to_domain(list)
            })
            .collect())
    }

    async fn count_texts(&self, scope: TextScope) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM texts WHERE ($1::uuid IS NULL OR user_id = $1)",
        )
        .bind(owner_filter(scope))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn get_text_by_id(&self, text_id: Uuid) -> PortResult<Text> {
        let record = sqlx::query_as::<_, TextRecord>(&format!(
            "SELECT {} FROM texts WHERE id = $1",
            TEXT_COLUMNS
        ))
        .bind(text_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Text {} not found", text_id)))?;

        let list = self
            .contributions_for(&[text_id])
            .await?
            .remove(&text_id)
            .unwrap_or_default();
        Ok(record.to_domain(list))
    }

    async fn create_text(&self, text: &Text) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(&format!(
            "INSERT INTO texts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            TEXT_COLUMNS
        ))
        .bind(text.id)
        .bind(text.user_id)
        .bind(&text.user_text)
        .bind(&text.corrected_text)
        .bind(&text.corrected_text_vi)
        .bind(&text.corrected_by)
        .bind(text.correction_date)
        .bind(text.created_at)
        .bind(text.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        insert_contributions(&mut tx, text.id, &text.contributions)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn insert_contribution(
        &self,
        text_id: Uuid,
        contribution: &Contribution,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Locks the parent row so a concurrent text deletion cannot interleave.
        let updated = sqlx::query("UPDATE texts SET updated_at = $2 WHERE id = $1")
            .bind(text_id)
            .bind(contribution.created_at)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Text {} not found", text_id)));
        }

        insert_contributions(&mut tx, text_id, std::slice::from_ref(contribution))
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn delete_contribution(&self, text_id: Uuid, contribution_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let deleted = sqlx::query("DELETE FROM contributions WHERE id = $1 AND text_id = $2")
            .bind(contribution_id)
            .bind(text_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Contribution {} not found",
                contribution_id
            )));
        }

        sqlx::query("UPDATE texts SET updated_at = now() WHERE id = $1")
            .bind(text_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn delete_text(&self, text_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM texts WHERE id = $1")
            .bind(text_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Text {} not found", text_id)));
        }
        Ok(())
    }
}
