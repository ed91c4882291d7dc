//! crates/text_review_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{Contribution, Identity, Text, User, UserCredentials, UserSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Which texts a listing read is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextScope {
    All,
    OwnedBy(Uuid),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    /// Display fields for every id that still exists. Unknown ids are skipped.
    async fn get_user_summaries(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserSummary>>;

    /// Users newest first; `keyword` matches username or email, case-insensitively.
    async fn list_users(
        &self,
        keyword: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> PortResult<Vec<User>>;

    async fn count_users(&self, keyword: Option<&str>) -> PortResult<u64>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired session to the caller's identity.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Text Management ---
    /// Texts in `scope`, newest first, with their contributions in insertion order.
    async fn find_texts(&self, scope: TextScope, skip: u64, limit: u64) -> PortResult<Vec<Text>>;

    async fn count_texts(&self, scope: TextScope) -> PortResult<u64>;

    async fn get_text_by_id(&self, text_id: Uuid) -> PortResult<Text>;

    async fn create_text(&self, text: &Text) -> PortResult<()>;

    /// Appends one contribution to a stored text and bumps its `updated_at`.
    /// Contributions written by other requests are left alone.
    async fn insert_contribution(
        &self,
        text_id: Uuid,
        contribution: &Contribution,
    ) -> PortResult<()>;

    /// Removes one contribution. `NotFound` when the text or the contribution
    /// no longer exists.
    async fn delete_contribution(&self, text_id: Uuid, contribution_id: Uuid) -> PortResult<()>;

    /// Deletes a text and every contribution it owns.
    async fn delete_text(&self, text_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait CorrectionService: Send + Sync {
    /// Returns the proofread version of `text`.
    async fn correct_text(&self, text: &str) -> PortResult<String>;
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translates English text into Vietnamese. `None` when the model returned nothing.
    async fn translate_to_vietnamese(&self, text: &str) -> PortResult<Option<String>>;
}
