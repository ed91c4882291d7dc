//! crates/text_review_core/src/testing.rs
//!
//! In-process fixtures for the service ports, used by the test suites of this
//! crate and of the API service (`test-support` feature).

use crate::domain::{Contribution, Identity, Text, User, UserCredentials, UserSummary};
use crate::ports::{
    CorrectionService, DatabaseService, PortError, PortResult, TextScope, TranslationService,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

//=========================================================================================
// In-memory Database
//=========================================================================================

struct StoredUser {
    user: User,
    hashed_password: String,
}

#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    /// Insertion order; listings sort a copy.
    texts: Vec<Text>,
}

impl Tables {
    fn text_mut(&mut self, text_id: Uuid) -> PortResult<&mut Text> {
        self.texts
            .iter_mut()
            .find(|t| t.id == text_id)
            .ok_or_else(|| PortError::NotFound(format!("Text {} not found", text_id)))
    }
}

/// A `DatabaseService` backed by plain collections behind a mutex.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory database lock poisoned".to_string()))
    }

    /// Grants or revokes the admin flag directly, bypassing any API.
    pub fn set_admin(&self, user_id: Uuid, is_admin: bool) -> PortResult<()> {
        let mut tables = self.tables()?;
        let stored = tables
            .users
            .iter_mut()
            .find(|s| s.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        stored.user.is_admin = is_admin;
        Ok(())
    }

    /// Stores a text exactly as given, timestamps included.
    pub fn insert_text(&self, text: Text) -> PortResult<()> {
        self.tables()?.texts.push(text);
        Ok(())
    }
}

fn in_scope(scope: TextScope, text: &Text) -> bool {
    match scope {
        TextScope::All => true,
        TextScope::OwnedBy(user_id) => text.user_id == user_id,
    }
}

fn matches_keyword(user: &User, keyword: Option<&str>) -> bool {
    match keyword {
        None => true,
        Some(k) => {
            let k = k.to_lowercase();
            user.username.to_lowercase().contains(&k) || user.email.to_lowercase().contains(&k)
        }
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|s| s.user.email == email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables()?
            .users
            .iter()
            .find(|s| s.user.email == email)
            .map(|s| UserCredentials {
                user_id: s.user.id,
                email: s.user.email.clone(),
                hashed_password: s.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.tables()?
            .users
            .iter()
            .find(|s| s.user.id == user_id)
            .map(|s| s.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_summaries(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserSummary>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .filter(|s| user_ids.contains(&s.user.id))
            .map(|s| UserSummary::from(&s.user))
            .collect())
    }

    async fn list_users(
        &self,
        keyword: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> PortResult<Vec<User>> {
        let tables = self.tables()?;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .map(|s| s.user.clone())
            .filter(|u| matches_keyword(u, keyword))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_users(&self, keyword: Option<&str>) -> PortResult<u64> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .filter(|s| matches_keyword(&s.user, keyword))
            .count() as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables()?
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity> {
        let tables = self.tables()?;
        let (user_id, expires_at) = tables
            .sessions
            .get(session_id)
            .copied()
            .ok_or(PortError::Unauthorized)?;
        if expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        tables
            .users
            .iter()
            .find(|s| s.user.id == user_id)
            .map(|s| Identity { user_id, is_admin: s.user.is_admin })
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables()?.sessions.remove(session_id);
        Ok(())
    }

    async fn find_texts(&self, scope: TextScope, skip: u64, limit: u64) -> PortResult<Vec<Text>> {
        let tables = self.tables()?;
        let mut texts: Vec<Text> =
            tables.texts.iter().filter(|t| in_scope(scope, t)).cloned().collect();
        texts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(texts
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_texts(&self, scope: TextScope) -> PortResult<u64> {
        Ok(self.tables()?.texts.iter().filter(|t| in_scope(scope, t)).count() as u64)
    }

    async fn get_text_by_id(&self, text_id: Uuid) -> PortResult<Text> {
        self.tables()?
            .texts
            .iter()
            .find(|t| t.id == text_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Text {} not found", text_id)))
    }

    async fn create_text(&self, text: &Text) -> PortResult<()> {
        self.tables()?.texts.push(text.clone());
        Ok(())
    }

    async fn insert_contribution(
        &self,
        text_id: Uuid,
        contribution: &Contribution,
    ) -> PortResult<()> {
        let mut tables = self.tables()?;
        let stored = tables.text_mut(text_id)?;
        stored.contributions.push(contribution.clone());
        stored.updated_at = contribution.created_at;
        Ok(())
    }

    async fn delete_contribution(&self, text_id: Uuid, contribution_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        let stored = tables.text_mut(text_id)?;
        let before = stored.contributions.len();
        stored.contributions.retain(|c| c.id != contribution_id);
        if stored.contributions.len() == before {
            return Err(PortError::NotFound(format!(
                "Contribution {} not found",
                contribution_id
            )));
        }
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_text(&self, text_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        let before = tables.texts.len();
        tables.texts.retain(|t| t.id != text_id);
        if tables.texts.len() == before {
            return Err(PortError::NotFound(format!("Text {} not found", text_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// AI Stubs
//=========================================================================================

/// Correction stub: returns a canned reply, or fails when built with `failing`.
pub struct StubCorrector {
    reply: Option<String>,
}

impl StubCorrector {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()) }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CorrectionService for StubCorrector {
    async fn correct_text(&self, _text: &str) -> PortResult<String> {
        self.reply
            .clone()
            .ok_or_else(|| PortError::Unexpected("correction model unavailable".to_string()))
    }
}

/// Translation stub: returns a canned reply, or fails when built with `failing`.
pub struct StubTranslator {
    reply: Result<Option<String>, ()>,
}

impl StubTranslator {
    pub fn replying(reply: Option<&str>) -> Self {
        Self { reply: Ok(reply.map(str::to_string)) }
    }

    pub fn failing() -> Self {
        Self { reply: Err(()) }
    }
}

#[async_trait]
impl TranslationService for StubTranslator {
    async fn translate_to_vietnamese(&self, _text: &str) -> PortResult<Option<String>> {
        self.reply
            .clone()
            .map_err(|_| PortError::Unexpected("translation model unavailable".to_string()))
    }
}
