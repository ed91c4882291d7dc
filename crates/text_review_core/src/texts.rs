//! crates/text_review_core/src/texts.rs
//!
//! The text service: paginated listings with per-item contribution windows,
//! the single-text view, and every mutation of the text aggregate.

use crate::contributions::{window_contributions, Window};
use crate::domain::{require_non_empty, Contribution, Identity, Text, UserSummary};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageRequest};
use crate::ports::{CorrectionService, DatabaseService, TextScope, TranslationService};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

//=========================================================================================
// Read Models
//=========================================================================================

/// A text with its owner resolved for display.
///
/// The `contributions` of `text` are moved into the accompanying window, so
/// the field is empty on every read model produced by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextView {
    pub text: Text,
    pub owner: Option<UserSummary>,
}

/// A contribution with its author resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionView {
    pub contribution: Contribution,
    pub author: Option<UserSummary>,
}

/// One item of a text listing.
#[derive(Debug, Clone)]
pub struct ListedText {
    pub view: TextView,
    pub contributions: Window<ContributionView>,
}

/// The single-text view.
#[derive(Debug, Clone)]
pub struct TextDetail {
    pub view: TextView,
    pub contributions: Window<ContributionView>,
    pub can_delete: bool,
}

pub type TextListing = Page<ListedText>;

/// Display fields keyed by user id.
type Authors = HashMap<Uuid, UserSummary>;

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct TextService {
    db: Arc<dyn DatabaseService>,
    corrector: Arc<dyn CorrectionService>,
    translator: Arc<dyn TranslationService>,
}

impl TextService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        corrector: Arc<dyn CorrectionService>,
        translator: Arc<dyn TranslationService>,
    ) -> Self {
        Self { db, corrector, translator }
    }

    /// Lists one page of texts in `scope`, newest first. Every item carries
    /// its own window of contributions selected by the shared `inner` request.
    pub async fn list_texts(
        &self,
        scope: TextScope,
        outer: PageRequest,
        inner: PageRequest,
    ) -> ServiceResult<TextListing> {
        // Page and count are independent reads; they may disagree under concurrent writes.
        let (texts, total) = futures::try_join!(
            self.db.find_texts(scope, outer.skip(), outer.page_size()),
            self.db.count_texts(scope),
        )?;

        let windowed: Vec<(Text, Window<Contribution>)> = texts
            .into_iter()
            .map(|mut text| {
                let all = std::mem::take(&mut text.contributions);
                let window = window_contributions(&all, inner);
                (text, window)
            })
            .collect();

        let authors = self
            .resolve_authors(
                windowed
                    .iter()
                    .flat_map(|(text, window)| {
                        std::iter::once(text.user_id).chain(window.list.iter().map(|c| c.user_id))
                    })
                    .collect::<Vec<Uuid>>(),
            )
            .await?;

        let items = windowed
            .into_iter()
            .map(|(text, window)| ListedText {
                view: text_view(text, &authors),
                contributions: contribution_views(window, &authors),
            })
            .collect();

        Ok(Page { items, meta: outer.meta(total) })
    }

    /// Loads one text with a window of its contributions.
    pub async fn get_text(
        &self,
        text_id: Uuid,
        requester: Option<&Identity>,
        inner: PageRequest,
    ) -> ServiceResult<TextDetail> {
        let mut text = self.db.get_text_by_id(text_id).await?;
        let can_delete = text.can_delete(requester);

        let all = std::mem::take(&mut text.contributions);
        let window = window_contributions(&all, inner);

        let authors = self
            .resolve_authors(
                std::iter::once(text.user_id).chain(window.list.iter().map(|c| c.user_id)),
            )
            .await?;

        Ok(TextDetail {
            view: text_view(text, &authors),
            contributions: contribution_views(window, &authors),
            can_delete,
        })
    }

    /// Corrects, translates and stores a new text.
    ///
    /// The record is written once, after the AI calls: a failed correction
    /// stores nothing, while a failed translation only leaves the Vietnamese
    /// field empty.
    pub async fn create_text(
        &self,
        requester: &Identity,
        user_text: &str,
    ) -> ServiceResult<TextView> {
        let mut text = Text::new(requester.user_id, user_text)?;

        let corrected = self
            .corrector
            .correct_text(&text.user_text)
            .await
            .map_err(|e| {
                error!("Correction failed for new text {}: {:?}", text.id, e);
                ServiceError::UpstreamDependency(e.to_string())
            })?;
        // An empty reply is not a failure: keep the learner's own wording.
        let corrected = match corrected.trim() {
            "" => text.user_text.clone(),
            trimmed => trimmed.to_string(),
        };

        let translated = match self.translator.translate_to_vietnamese(&corrected).await {
            Ok(vi) => vi.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("Vietnamese translation failed for text {}: {}", text.id, e);
                None
            }
        };

        text.apply_correction(corrected, translated);
        self.db.create_text(&text).await?;
        info!("Created text {} for user {}", text.id, text.user_id);

        let authors = self.resolve_authors([text.user_id]).await?;
        Ok(text_view(text, &authors))
    }

    /// Deletes a text and, with it, all of its contributions.
    pub async fn delete_text(&self, text_id: Uuid, requester: &Identity) -> ServiceResult<()> {
        let text = self.db.get_text_by_id(text_id).await?;
        if !text.can_delete(Some(requester)) {
            return Err(ServiceError::Forbidden("Not allowed to delete this text".to_string()));
        }
        self.db.delete_text(text_id).await?;
        info!("Text {} deleted by user {}", text_id, requester.user_id);
        Ok(())
    }

    /// Appends a suggestion to a text.
    ///
    /// Only the new contribution is written, so suggestions committed by
    /// concurrent requests since the text was loaded survive.
    pub async fn add_contribution(
        &self,
        text_id: Uuid,
        requester: &Identity,
        suggestion: &str,
    ) -> ServiceResult<ContributionView> {
        let suggestion = require_non_empty("suggestion", suggestion)?;
        let mut text = self.db.get_text_by_id(text_id).await?;

        let contribution = text.append_contribution(requester.user_id, suggestion)?.clone();
        self.db.insert_contribution(text_id, &contribution).await?;

        let mut authors = self.resolve_authors([contribution.user_id]).await?;
        let author = authors.remove(&contribution.user_id);
        Ok(ContributionView { contribution, author })
    }

    /// Removes one contribution. Only its author or an admin may do so.
    pub async fn remove_contribution(
        &self,
        text_id: Uuid,
        contribution_id: Uuid,
        requester: &Identity,
    ) -> ServiceResult<()> {
        let mut text = self.db.get_text_by_id(text_id).await?;
        text.remove_contribution(contribution_id, requester)?;
        self.db.delete_contribution(text_id, contribution_id).await?;
        Ok(())
    }

    async fn resolve_authors(&self, ids: impl IntoIterator<Item = Uuid>) -> ServiceResult<Authors> {
        let unique: Vec<Uuid> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(Authors::new());
        }
        let summaries = self.db.get_user_summaries(&unique).await?;
        Ok(summaries.into_iter().map(|s| (s.id, s)).collect())
    }
}

fn text_view(text: Text, authors: &Authors) -> TextView {
    let owner = authors.get(&text.user_id).cloned();
    TextView { text, owner }
}

fn contribution_views(window: Window<Contribution>, authors: &Authors) -> Window<ContributionView> {
    Window {
        list: window
            .list
            .into_iter()
            .map(|contribution| ContributionView {
                author: authors.get(&contribution.user_id).cloned(),
                contribution,
            })
            .collect(),
        meta: window.meta,
    }
}

#[cfg(test)]
mod tests;
