//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API.
//!
//! Field names are the wire contract consumed by the web client: camelCase,
//! entity ids as `_id`, and nullable fields always present (as `null` when empty).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use text_review_core::{
    ContributionView, ListedText, Page, PageLimits, PageMeta, PageRequest, Profile, TextDetail,
    TextView, User, UserSummary, Window,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Query Parameters
//=========================================================================================

/// Outer (`page`, `limit`) and inner (`cpage`, `climit`) cursors of a text listing.
///
/// Values are kept as raw strings so malformed input falls back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page of texts, starting at 1.
    pub page: Option<String>,
    /// Texts per page (default 10, max 50).
    pub limit: Option<String>,
    /// Page of each text's contributions, starting at 1.
    pub cpage: Option<String>,
    /// Contributions per text (default 3, max 100).
    pub climit: Option<String>,
}

impl ListQuery {
    pub fn cursors(&self) -> (PageRequest, PageRequest) {
        let outer = PageRequest::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            PageLimits::TEXTS,
        );
        let inner = PageRequest::from_query(
            self.cpage.as_deref(),
            self.climit.as_deref(),
            PageLimits::LISTED_CONTRIBUTIONS,
        );
        (outer, inner)
    }
}

/// Contribution cursor of the single-text view.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContributionQuery {
    /// Page of contributions, starting at 1.
    pub cpage: Option<String>,
    /// Contributions per page (default 10, max 100).
    pub climit: Option<String>,
}

impl ContributionQuery {
    pub fn cursor(&self) -> PageRequest {
        PageRequest::from_query(
            self.cpage.as_deref(),
            self.climit.as_deref(),
            PageLimits::DETAIL_CONTRIBUTIONS,
        )
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page: Option<String>,
    /// Users per page (default 10, max 100).
    pub limit: Option<String>,
    /// Case-insensitive match on username or email.
    pub keyword: Option<String>,
}

impl UserQuery {
    pub fn cursor(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref(), PageLimits::USERS)
    }
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTextRequest {
    #[serde(default)]
    pub user_text: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContributionRequest {
    #[serde(default)]
    pub suggestion: Option<String>,
}

//=========================================================================================
// Response Bodies
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

/// Public display fields of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<UserSummary> for UserDto {
    fn from(summary: UserSummary) -> Self {
        Self { id: summary.id, username: summary.username, email: summary.email }
    }
}

/// Outer or inner page metadata.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetaDto {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl From<PageMeta> for PageMetaDto {
    fn from(meta: PageMeta) -> Self {
        Self {
            total: meta.total,
            page: meta.page,
            page_size: meta.page_size,
            total_pages: meta.total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Option<UserDto>,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContributionView> for ContributionDto {
    fn from(view: ContributionView) -> Self {
        Self {
            id: view.contribution.id,
            user: view.author.map(UserDto::from),
            suggestion: view.contribution.suggestion,
            created_at: view.contribution.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Option<UserDto>,
    pub user_text: String,
    pub corrected_text: Option<String>,
    pub corrected_text_vi: Option<String>,
    pub corrected_by: Option<String>,
    pub correction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TextView> for TextDto {
    fn from(view: TextView) -> Self {
        let text = view.text;
        Self {
            id: text.id,
            user: view.owner.map(UserDto::from),
            user_text: text.user_text,
            corrected_text: text.corrected_text,
            corrected_text_vi: text.corrected_text_vi,
            corrected_by: text.corrected_by,
            correction_date: text.correction_date,
            created_at: text.created_at,
            updated_at: text.updated_at,
        }
    }
}

fn contribution_list(window: Window<ContributionView>) -> (Vec<ContributionDto>, PageMetaDto) {
    let meta = PageMetaDto::from(window.meta);
    (window.list.into_iter().map(ContributionDto::from).collect(), meta)
}

/// One text of a listing with its own contribution page.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListedTextDto {
    #[serde(flatten)]
    pub text: TextDto,
    pub contributions: Vec<ContributionDto>,
    pub contrib: PageMetaDto,
}

impl From<ListedText> for ListedTextDto {
    fn from(item: ListedText) -> Self {
        let (contributions, contrib) = contribution_list(item.contributions);
        Self { text: TextDto::from(item.view), contributions, contrib }
    }
}

/// `{ items, total, page, pageSize, totalPages }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TextListResponse {
    pub items: Vec<ListedTextDto>,
    #[serde(flatten)]
    pub meta: PageMetaDto,
}

impl From<Page<ListedText>> for TextListResponse {
    fn from(page: Page<ListedText>) -> Self {
        Self {
            items: page.items.into_iter().map(ListedTextDto::from).collect(),
            meta: page.meta.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextItemDto {
    #[serde(flatten)]
    pub text: TextDto,
    pub can_delete: bool,
}

/// `{ item: {..., canDelete}, contributions, contrib }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TextDetailResponse {
    pub item: TextItemDto,
    pub contributions: Vec<ContributionDto>,
    pub contrib: PageMetaDto,
}

impl From<TextDetail> for TextDetailResponse {
    fn from(detail: TextDetail) -> Self {
        let (contributions, contrib) = contribution_list(detail.contributions);
        Self {
            item: TextItemDto { text: TextDto::from(detail.view), can_delete: detail.can_delete },
            contributions,
            contrib,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContributionCreatedResponse {
    pub message: String,
    pub contribution: ContributionDto,
}

//=========================================================================================
// Accounts
//=========================================================================================

/// A user row of the admin directory.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserAccountDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<UserAccountDto>,
    #[serde(flatten)]
    pub meta: PageMetaDto,
}

impl From<Page<User>> for UserListResponse {
    fn from(page: Page<User>) -> Self {
        Self {
            items: page.items.into_iter().map(UserAccountDto::from).collect(),
            meta: page.meta.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub total_texts: u64,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username,
            email: profile.user.email,
            is_admin: profile.user.is_admin,
            created_at: profile.user.created_at,
            total_texts: profile.total_texts,
        }
    }
}
