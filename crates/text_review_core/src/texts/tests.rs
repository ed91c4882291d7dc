//! Tests for the text service against the in-memory store.

use super::*;
use crate::pagination::PageLimits;
use crate::domain::{User, UserCredentials};
use crate::ports::{PortError, PortResult};
use crate::testing::{InMemoryDatabase, StubCorrector, StubTranslator};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

struct Harness {
    db: Arc<InMemoryDatabase>,
    service: TextService,
    alice: Identity,
    bob: Identity,
}

impl Harness {
    async fn with_ai(corrector: StubCorrector, translator: StubTranslator) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let alice = db.create_user("alice", "alice@example.com", "hash").await.unwrap();
        let bob = db.create_user("bob", "bob@example.com", "hash").await.unwrap();
        let service = TextService::new(db.clone(), Arc::new(corrector), Arc::new(translator));
        Self {
            db,
            service,
            alice: Identity { user_id: alice.id, is_admin: false },
            bob: Identity { user_id: bob.id, is_admin: false },
        }
    }

    async fn new() -> Self {
        Self::with_ai(
            StubCorrector::replying("I have an apple."),
            StubTranslator::replying(Some("Tôi có một quả táo.")),
        )
        .await
    }

    /// Stores a text created `minute` minutes after a fixed epoch.
    fn seed_text(&self, owner: &Identity, minute: i64) -> Text {
        let mut text = Text::new(owner.user_id, &format!("text {minute}")).unwrap();
        text.created_at = epoch() + Duration::minutes(minute);
        text.updated_at = text.created_at;
        self.db.insert_text(text.clone()).unwrap();
        text
    }
}

fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn outer(page: i64, size: i64) -> PageRequest {
    PageRequest::new(Some(page), Some(size), PageLimits::TEXTS)
}

fn inner(page: i64, size: i64) -> PageRequest {
    PageRequest::new(Some(page), Some(size), PageLimits::LISTED_CONTRIBUTIONS)
}

#[fixture]
fn default_inner() -> PageRequest {
    PageRequest::new(None, None, PageLimits::LISTED_CONTRIBUTIONS)
}

//=========================================================================================
// Listing
//=========================================================================================

#[rstest]
#[tokio::test]
async fn empty_listing_has_one_page(default_inner: PageRequest) {
    let h = Harness::new().await;
    let listing = h.service.list_texts(TextScope::All, outer(1, 10), default_inner).await.unwrap();

    assert!(listing.items.is_empty());
    assert_eq!(listing.meta.total, 0);
    assert_eq!(listing.meta.total_pages, 1);
    assert_eq!(listing.meta.page, 1);
    assert_eq!(listing.meta.page_size, 10);
}

#[rstest]
#[tokio::test]
async fn outer_pages_are_newest_first(default_inner: PageRequest) {
    let h = Harness::new().await;
    for minute in 0..5 {
        h.seed_text(&h.alice, minute);
    }

    let first = h.service.list_texts(TextScope::All, outer(1, 2), default_inner).await.unwrap();
    let texts: Vec<&str> = first.items.iter().map(|i| i.view.text.user_text.as_str()).collect();
    assert_eq!(texts, ["text 4", "text 3"]);
    assert_eq!(first.meta.total, 5);
    assert_eq!(first.meta.total_pages, 3);

    let last = h.service.list_texts(TextScope::All, outer(3, 2), default_inner).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].view.text.user_text, "text 0");
}

#[rstest]
#[tokio::test]
async fn owned_scope_only_counts_the_callers_texts(default_inner: PageRequest) {
    let h = Harness::new().await;
    h.seed_text(&h.alice, 1);
    h.seed_text(&h.bob, 2);
    h.seed_text(&h.alice, 3);

    let mine = h
        .service
        .list_texts(TextScope::OwnedBy(h.alice.user_id), outer(1, 10), default_inner)
        .await
        .unwrap();

    assert_eq!(mine.meta.total, 2);
    assert!(mine.items.iter().all(|i| i.view.text.user_id == h.alice.user_id));
    let owner = mine.items[0].view.owner.as_ref().unwrap();
    assert_eq!(owner.username, "alice");
    assert_eq!(owner.email, "alice@example.com");
}

#[tokio::test]
async fn every_item_gets_its_own_contribution_window() {
    let h = Harness::new().await;
    let busy = h.seed_text(&h.alice, 2);
    h.seed_text(&h.alice, 1);
    for n in 0..5 {
        h.service
            .add_contribution(busy.id, &h.bob, &format!("idea {n}"))
            .await
            .unwrap();
    }

    let listing = h.service.list_texts(TextScope::All, outer(1, 10), inner(1, 2)).await.unwrap();

    let busy_item = &listing.items[0];
    assert_eq!(busy_item.view.text.id, busy.id);
    assert_eq!(busy_item.contributions.list.len(), 2);
    assert_eq!(busy_item.contributions.meta.total, 5);
    assert_eq!(busy_item.contributions.meta.total_pages, 3);
    assert_eq!(
        busy_item.contributions.list[0].author.as_ref().map(|a| a.username.as_str()),
        Some("bob")
    );

    let quiet_item = &listing.items[1];
    assert!(quiet_item.contributions.list.is_empty());
    assert_eq!(quiet_item.contributions.meta.total, 0);
    assert_eq!(quiet_item.contributions.meta.total_pages, 1);
    assert_eq!(listing.meta.total, 2);
}

#[tokio::test]
async fn inner_pages_follow_creation_time_not_storage_order() {
    let h = Harness::new().await;
    let mut text = Text::new(h.alice.user_id, "ordering").unwrap();
    for (label, minute) in [("c", 3), ("a", 1), ("e", 5), ("b", 2), ("d", 4)] {
        text.contributions.push(Contribution {
            id: Uuid::new_v4(),
            user_id: h.bob.user_id,
            suggestion: label.to_string(),
            created_at: epoch() + Duration::minutes(minute),
        });
    }
    h.db.insert_text(text.clone()).unwrap();

    let page = |n| h.service.get_text(text.id, None, inner(n, 2));
    let first = page(1).await.unwrap().contributions;
    let labels: Vec<&str> = first.list.iter().map(|c| c.contribution.suggestion.as_str()).collect();
    assert_eq!(labels, ["e", "d"]);
    assert_eq!(first.meta.total_pages, 3);

    let third = page(3).await.unwrap().contributions;
    assert_eq!(third.list.len(), 1);
    assert_eq!(third.list[0].contribution.suggestion, "a");

    let again = page(2).await.unwrap().contributions;
    assert_eq!(page(2).await.unwrap().contributions, again);
}

//=========================================================================================
// Single Text
//=========================================================================================

#[tokio::test]
async fn detail_reports_delete_permission() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let detail_page = PageRequest::new(None, None, PageLimits::DETAIL_CONTRIBUTIONS);
    let admin = Identity { user_id: Uuid::new_v4(), is_admin: true };

    let as_owner = h.service.get_text(text.id, Some(&h.alice), detail_page).await.unwrap();
    let as_admin = h.service.get_text(text.id, Some(&admin), detail_page).await.unwrap();
    let as_other = h.service.get_text(text.id, Some(&h.bob), detail_page).await.unwrap();
    let anonymous = h.service.get_text(text.id, None, detail_page).await.unwrap();

    assert!(as_owner.can_delete);
    assert!(as_admin.can_delete);
    assert!(!as_other.can_delete);
    assert!(!anonymous.can_delete);
    assert_eq!(anonymous.contributions.meta.page_size, 10);
}

#[tokio::test]
async fn missing_text_is_not_found() {
    let h = Harness::new().await;
    let err = h
        .service
        .get_text(Uuid::new_v4(), None, inner(1, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

//=========================================================================================
// Creation
//=========================================================================================

#[tokio::test]
async fn create_stores_correction_and_translation() {
    let h = Harness::new().await;
    let view = h.service.create_text(&h.alice, "  I has a apple.  ").await.unwrap();

    assert_eq!(view.text.user_text, "I has a apple.");
    assert_eq!(view.text.corrected_text.as_deref(), Some("I have an apple."));
    assert_eq!(view.text.corrected_text_vi.as_deref(), Some("Tôi có một quả táo."));
    assert_eq!(view.text.corrected_by.as_deref(), Some("AI"));
    assert_eq!(view.owner.map(|o| o.username), Some("alice".to_string()));

    let stored = h.db.get_text_by_id(view.text.id).await.unwrap();
    assert_eq!(stored.corrected_text, view.text.corrected_text);
}

#[tokio::test]
async fn failed_translation_still_creates_the_text() {
    let h =
        Harness::with_ai(StubCorrector::replying("She goes home."), StubTranslator::failing())
            .await;
    let view = h.service.create_text(&h.alice, "She go home.").await.unwrap();

    let stored = h.db.get_text_by_id(view.text.id).await.unwrap();
    assert_eq!(stored.corrected_text.as_deref(), Some("She goes home."));
    assert_eq!(stored.corrected_text_vi, None);
}

#[rstest]
#[case(Some("   "))]
#[case(None)]
#[tokio::test]
async fn empty_translation_is_stored_as_null(#[case] reply: Option<&str>) {
    let h = Harness::with_ai(StubCorrector::replying("Fine."), StubTranslator::replying(reply))
        .await;
    let view = h.service.create_text(&h.alice, "Fine").await.unwrap();
    assert_eq!(view.text.corrected_text_vi, None);
}

#[tokio::test]
async fn empty_correction_falls_back_to_the_input() {
    let h = Harness::with_ai(StubCorrector::replying("  "), StubTranslator::replying(None)).await;
    let view = h.service.create_text(&h.alice, "Already right.").await.unwrap();
    assert_eq!(view.text.corrected_text.as_deref(), Some("Already right."));
}

#[tokio::test]
async fn failed_correction_stores_nothing() {
    let h = Harness::with_ai(StubCorrector::failing(), StubTranslator::replying(None)).await;
    let err = h.service.create_text(&h.alice, "Hello").await.unwrap_err();

    assert!(matches!(err, ServiceError::UpstreamDependency(_)));
    assert_eq!(h.db.count_texts(TextScope::All).await.unwrap(), 0);
}

#[tokio::test]
async fn blank_text_is_rejected_before_any_ai_call() {
    let h = Harness::with_ai(StubCorrector::failing(), StubTranslator::failing()).await;
    let err = h.service.create_text(&h.alice, " \n ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

//=========================================================================================
// Contributions
//=========================================================================================

#[tokio::test]
async fn appended_contribution_leads_the_first_inner_page() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    for n in 0..4 {
        h.service.add_contribution(text.id, &h.alice, &format!("old {n}")).await.unwrap();
    }

    let added = h
        .service
        .add_contribution(text.id, &h.bob, "  use 'an' before vowels ")
        .await
        .unwrap();
    assert_eq!(added.contribution.suggestion, "use 'an' before vowels");
    assert_eq!(added.author.as_ref().map(|a| a.email.as_str()), Some("bob@example.com"));

    let detail = h.service.get_text(text.id, None, inner(1, 3)).await.unwrap();
    assert_eq!(detail.contributions.list[0].contribution.id, added.contribution.id);
    assert_eq!(detail.contributions.meta.total, 5);
}

#[tokio::test]
async fn contribution_validation_and_lookup() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);

    let blank = h.service.add_contribution(text.id, &h.bob, "   ").await.unwrap_err();
    assert!(matches!(blank, ServiceError::Validation(_)));

    let missing = h.service.add_contribution(Uuid::new_v4(), &h.bob, "hi").await.unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn forbidden_removal_leaves_the_sequence_unchanged() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let added = h.service.add_contribution(text.id, &h.bob, "comma").await.unwrap();
    let before = h.db.get_text_by_id(text.id).await.unwrap().contributions;

    // The text owner is not the contribution's author.
    let err = h
        .service
        .remove_contribution(text.id, added.contribution.id, &h.alice)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(h.db.get_text_by_id(text.id).await.unwrap().contributions, before);
}

#[tokio::test]
async fn removal_by_author_or_admin_keeps_siblings() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let first = h.service.add_contribution(text.id, &h.bob, "one").await.unwrap();
    let second = h.service.add_contribution(text.id, &h.bob, "two").await.unwrap();
    let third = h.service.add_contribution(text.id, &h.alice, "three").await.unwrap();

    h.service
        .remove_contribution(text.id, second.contribution.id, &h.bob)
        .await
        .unwrap();
    let admin = Identity { user_id: Uuid::new_v4(), is_admin: true };
    h.service
        .remove_contribution(text.id, third.contribution.id, &admin)
        .await
        .unwrap();

    let remaining = h.db.get_text_by_id(text.id).await.unwrap().contributions;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.contribution.id);

    let again = h
        .service
        .remove_contribution(text.id, second.contribution.id, &h.bob)
        .await
        .unwrap_err();
    assert!(matches!(again, ServiceError::NotFound(_)));
}

//=========================================================================================
// Deletion
//=========================================================================================

#[tokio::test]
async fn only_owner_or_admin_deletes_a_text() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    h.service.add_contribution(text.id, &h.bob, "nice").await.unwrap();

    let err = h.service.delete_text(text.id, &h.bob).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    h.service.delete_text(text.id, &h.alice).await.unwrap();
    assert!(matches!(
        h.db.get_text_by_id(text.id).await,
        Err(PortError::NotFound(_))
    ));

    let gone = h.service.delete_text(text.id, &h.alice).await.unwrap_err();
    assert!(matches!(gone, ServiceError::NotFound(_)));
}

//=========================================================================================
// Interleaved Requests
//=========================================================================================

/// Delegates to the in-memory store but yields after every text load, so two
/// requests joined on one task both read before either writes.
struct YieldAfterLoad(Arc<InMemoryDatabase>);

#[async_trait]
impl DatabaseService for YieldAfterLoad {
    async fn create_user(&self, username: &str, email: &str, hash: &str) -> PortResult<User> {
        self.0.create_user(username, email, hash).await
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.0.get_user_by_email(email).await
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.0.get_user_by_id(user_id).await
    }

    async fn get_user_summaries(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserSummary>> {
        self.0.get_user_summaries(user_ids).await
    }

    async fn list_users(
        &self,
        keyword: Option<&str>,
        skip: u64,
        limit: u64,
    ) -> PortResult<Vec<User>> {
        self.0.list_users(keyword, skip, limit).await
    }

    async fn count_users(&self, keyword: Option<&str>) -> PortResult<u64> {
        self.0.count_users(keyword).await
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.0.create_auth_session(session_id, user_id, expires_at).await
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity> {
        self.0.validate_auth_session(session_id).await
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.0.delete_auth_session(session_id).await
    }

    async fn find_texts(&self, scope: TextScope, skip: u64, limit: u64) -> PortResult<Vec<Text>> {
        self.0.find_texts(scope, skip, limit).await
    }

    async fn count_texts(&self, scope: TextScope) -> PortResult<u64> {
        self.0.count_texts(scope).await
    }

    async fn get_text_by_id(&self, text_id: Uuid) -> PortResult<Text> {
        let text = self.0.get_text_by_id(text_id).await;
        tokio::task::yield_now().await;
        text
    }

    async fn create_text(&self, text: &Text) -> PortResult<()> {
        self.0.create_text(text).await
    }

    async fn insert_contribution(
        &self,
        text_id: Uuid,
        contribution: &Contribution,
    ) -> PortResult<()> {
        self.0.insert_contribution(text_id, contribution).await
    }

    async fn delete_contribution(&self, text_id: Uuid, contribution_id: Uuid) -> PortResult<()> {
        self.0.delete_contribution(text_id, contribution_id).await
    }

    async fn delete_text(&self, text_id: Uuid) -> PortResult<()> {
        self.0.delete_text(text_id).await
    }
}

impl Harness {
    /// A service over the same store whose text loads yield before returning.
    fn interleaving_service(&self) -> TextService {
        TextService::new(
            Arc::new(YieldAfterLoad(self.db.clone())),
            Arc::new(StubCorrector::replying("unused")),
            Arc::new(StubTranslator::replying(None)),
        )
    }

    async fn stored_suggestions(&self, text_id: Uuid) -> Vec<String> {
        let text = self.db.get_text_by_id(text_id).await.unwrap();
        let mut all: Vec<String> = text.contributions.into_iter().map(|c| c.suggestion).collect();
        all.sort();
        all
    }
}

#[tokio::test]
async fn concurrent_appends_both_survive() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let service = h.interleaving_service();

    let (from_alice, from_bob) = tokio::join!(
        service.add_contribution(text.id, &h.alice, "from alice"),
        service.add_contribution(text.id, &h.bob, "from bob"),
    );

    assert!(from_alice.is_ok());
    assert!(from_bob.is_ok());
    assert_eq!(h.stored_suggestions(text.id).await, ["from alice", "from bob"]);
}

#[tokio::test]
async fn removal_racing_an_append_stays_removed() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let doomed = h.service.add_contribution(text.id, &h.bob, "doomed").await.unwrap();
    let service = h.interleaving_service();

    let (added, removed) = tokio::join!(
        service.add_contribution(text.id, &h.alice, "fresh"),
        service.remove_contribution(text.id, doomed.contribution.id, &h.bob),
    );

    assert!(added.is_ok());
    assert!(removed.is_ok());
    assert_eq!(h.stored_suggestions(text.id).await, ["fresh"]);
}

#[tokio::test]
async fn second_of_two_racing_removals_is_not_found() {
    let h = Harness::new().await;
    let text = h.seed_text(&h.alice, 0);
    let target = h.service.add_contribution(text.id, &h.bob, "typo").await.unwrap();
    let admin = Identity { user_id: Uuid::new_v4(), is_admin: true };
    let service = h.interleaving_service();

    let (by_author, by_admin) = tokio::join!(
        service.remove_contribution(text.id, target.contribution.id, &h.bob),
        service.remove_contribution(text.id, target.contribution.id, &admin),
    );

    assert!(by_author.is_ok());
    assert!(matches!(by_admin, Err(ServiceError::NotFound(_))));
    assert!(h.stored_suggestions(text.id).await.is_empty());
}
