//! crates/text_review_core/src/users.rs
//!
//! Read access to user accounts: the caller's own profile and the admin-only
//! user directory.

use crate::domain::{Identity, User};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageRequest};
use crate::ports::{DatabaseService, TextScope};
use std::sync::Arc;

/// The caller's own account together with how many texts they submitted.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub total_texts: u64,
}

#[derive(Clone)]
pub struct UserDirectory {
    db: Arc<dyn DatabaseService>,
}

impl UserDirectory {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn profile(&self, requester: &Identity) -> ServiceResult<Profile> {
        let user = self.db.get_user_by_id(requester.user_id).await?;
        let total_texts = self.db.count_texts(TextScope::OwnedBy(user.id)).await?;
        Ok(Profile { user, total_texts })
    }

    /// Pages through all users, newest first. Admins only.
    pub async fn list_users(
        &self,
        requester: &Identity,
        keyword: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<User>> {
        if !requester.is_admin {
            return Err(ServiceError::Forbidden(
                "Only admins may list users".to_string(),
            ));
        }
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

        let (items, total) = futures::try_join!(
            self.db.list_users(keyword, page.skip(), page.page_size()),
            self.db.count_users(keyword),
        )?;

        Ok(Page { items, meta: page.meta(total) })
    }
}
