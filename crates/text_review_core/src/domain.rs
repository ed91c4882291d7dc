//! crates/text_review_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Attribution stored on every text corrected by the language model.
pub const AI_CORRECTOR: &str = "AI";

/// Trims `value` and rejects it when nothing is left.
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    let clean = value.trim();
    if clean.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(clean)
}

/// Represents a user - used throughout app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// The public display fields of a user attached to texts and contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Identity {
    /// True when this caller may act on something owned by `owner`.
    pub fn can_manage(&self, owner: Uuid) -> bool {
        self.is_admin || self.user_id == owner
    }
}

/// A suggestion appended to a text by any user. Only exists inside a `Text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub id: Uuid,
    pub user_id: Uuid,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}

/// A submitted text together with its contributions, saved as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_text: String,
    pub corrected_text: Option<String>,
    pub corrected_text_vi: Option<String>,
    pub corrected_by: Option<String>,
    pub correction_date: Option<DateTime<Utc>>,
    /// Kept in insertion order.
    pub contributions: Vec<Contribution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Text {
    /// Creates a fresh, uncorrected text. `user_text` is trimmed and must not
    /// be empty.
    pub fn new(user_id: Uuid, user_text: &str) -> ServiceResult<Self> {
        let clean = require_non_empty("userText", user_text)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            user_text: clean.to_string(),
            corrected_text: None,
            corrected_text_vi: None,
            corrected_by: None,
            correction_date: None,
            contributions: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Records the outcome of the AI correction step.
    pub fn apply_correction(&mut self, corrected: String, translated: Option<String>) {
        self.corrected_text = Some(corrected);
        self.corrected_text_vi = translated;
        self.corrected_by = Some(AI_CORRECTOR.to_string());
        self.correction_date = Some(Utc::now());
    }

    /// Whether `requester` may delete this text. Anonymous callers never can.
    pub fn can_delete(&self, requester: Option<&Identity>) -> bool {
        requester.is_some_and(|identity| identity.can_manage(self.user_id))
    }

    /// Appends a new contribution at the end of the sequence.
    pub fn append_contribution(
        &mut self,
        user_id: Uuid,
        suggestion: &str,
    ) -> ServiceResult<&Contribution> {
        let clean = require_non_empty("suggestion", suggestion)?;
        let now = Utc::now();
        self.contributions.push(Contribution {
            id: Uuid::new_v4(),
            user_id,
            suggestion: clean.to_string(),
            created_at: now,
        });
        self.updated_at = now;
        Ok(&self.contributions[self.contributions.len() - 1])
    }

    /// Removes one contribution. Siblings keep their ids and relative order;
    /// on any error the sequence is left untouched.
    pub fn remove_contribution(
        &mut self,
        contribution_id: Uuid,
        requester: &Identity,
    ) -> ServiceResult<Contribution> {
        let position = self
            .contributions
            .iter()
            .position(|c| c.id == contribution_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Contribution {} not found", contribution_id))
            })?;

        if !requester.can_manage(self.contributions[position].user_id) {
            return Err(ServiceError::Forbidden(
                "Not allowed to delete this contribution".to_string(),
            ));
        }

        self.updated_at = Utc::now();
        Ok(self.contributions.remove(position))
    }
}
