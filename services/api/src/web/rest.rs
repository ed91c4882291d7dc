//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the text endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::auth;
use crate::web::dto::{
    ContributionCreatedResponse, ContributionDto, ContributionQuery, CreateContributionRequest,
    CreateTextRequest, ListQuery, ListedTextDto, MessageResponse, PageMetaDto, ProfileResponse,
    TextDetailResponse, TextDto, TextItemDto, TextListResponse, UserAccountDto, UserDto,
    UserListResponse,
};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::middleware::{CurrentUser, MaybeUser};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use text_review_core::TextScope;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_texts_handler,
        list_my_texts_handler,
        get_text_handler,
        create_text_handler,
        delete_text_handler,
        add_contribution_handler,
        delete_contribution_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::list_users_handler,
    ),
    components(
        schemas(
            TextListResponse, ListedTextDto, TextDetailResponse, TextItemDto, TextDto,
            ContributionDto, ContributionCreatedResponse, UserDto, PageMetaDto,
            CreateTextRequest, CreateContributionRequest, MessageResponse, ErrorBody,
            UserListResponse, UserAccountDto, ProfileResponse,
            auth::RegisterRequest, auth::RegisterResponse, auth::LoginRequest,
            auth::LoginResponse, auth::AuthUser,
        )
    ),
    tags(
        (name = "Text Review API", description = "AI-corrected English texts and peer suggestions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Listing Handlers
//=========================================================================================

/// List all texts, newest first, each with one page of its contributions.
#[utoipa::path(
    get,
    path = "/api/texts",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of texts", body = TextListResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_texts_handler(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<TextListResponse>, ApiError> {
    let (outer, inner) = query.cursors();
    let listing = app_state.texts.list_texts(TextScope::All, outer, inner).await?;
    Ok(Json(listing.into()))
}

/// List the caller's own texts, newest first.
#[utoipa::path(
    get,
    path = "/api/texts/me",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of the caller's texts", body = TextListResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn list_my_texts_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<TextListResponse>, ApiError> {
    let (outer, inner) = query.cursors();
    let listing = app_state
        .texts
        .list_texts(TextScope::OwnedBy(identity.user_id), outer, inner)
        .await?;
    Ok(Json(listing.into()))
}

/// Fetch one text with a page of its contributions.
///
/// `canDelete` tells the caller whether they own the text or are an admin.
#[utoipa::path(
    get,
    path = "/api/texts/{id}",
    params(("id" = Uuid, Path, description = "Text id"), ContributionQuery),
    responses(
        (status = 200, description = "The text", body = TextDetailResponse),
        (status = 404, description = "No such text", body = ErrorBody)
    )
)]
pub async fn get_text_handler(
    State(app_state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ApiPath(text_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ContributionQuery>,
) -> Result<Json<TextDetailResponse>, ApiError> {
    let detail = app_state
        .texts
        .get_text(text_id, identity.as_ref(), query.cursor())
        .await?;
    Ok(Json(detail.into()))
}

//=========================================================================================
// Mutation Handlers
//=========================================================================================

/// Submit a text for AI correction and Vietnamese translation.
#[utoipa::path(
    post,
    path = "/api/texts",
    request_body = CreateTextRequest,
    responses(
        (status = 201, description = "Text corrected and stored", body = TextDto),
        (status = 400, description = "Missing userText", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 502, description = "AI correction failed", body = ErrorBody)
    )
)]
pub async fn create_text_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiJson(req): ApiJson<CreateTextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .texts
        .create_text(&identity, req.user_text.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(TextDto::from(view))))
}

/// Delete a text and all of its contributions.
#[utoipa::path(
    delete,
    path = "/api/texts/{id}",
    params(("id" = Uuid, Path, description = "Text id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Neither owner nor admin", body = ErrorBody),
        (status = 404, description = "No such text", body = ErrorBody)
    )
)]
pub async fn delete_text_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiPath(text_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state.texts.delete_text(text_id, &identity).await?;
    Ok(Json(MessageResponse::new("Text deleted")))
}

/// Append a suggestion to a text.
#[utoipa::path(
    post,
    path = "/api/texts/{id}/contributions",
    params(("id" = Uuid, Path, description = "Text id")),
    request_body = CreateContributionRequest,
    responses(
        (status = 201, description = "Contribution added", body = ContributionCreatedResponse),
        (status = 400, description = "Missing suggestion", body = ErrorBody),
        (status = 404, description = "No such text", body = ErrorBody)
    )
)]
pub async fn add_contribution_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiPath(text_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateContributionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .texts
        .add_contribution(text_id, &identity, req.suggestion.as_deref().unwrap_or_default())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ContributionCreatedResponse {
            message: "Contribution added".to_string(),
            contribution: view.into(),
        }),
    ))
}

/// Remove a contribution. Allowed for its author and for admins.
#[utoipa::path(
    delete,
    path = "/api/texts/{id}/contributions/{cid}",
    params(
        ("id" = Uuid, Path, description = "Text id"),
        ("cid" = Uuid, Path, description = "Contribution id")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Neither author nor admin", body = ErrorBody),
        (status = 404, description = "No such text or contribution", body = ErrorBody)
    )
)]
pub async fn delete_contribution_handler(
    State(app_state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiPath((text_id, contribution_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .texts
        .remove_contribution(text_id, contribution_id, &identity)
        .await?;
    Ok(Json(MessageResponse::new("Contribution deleted")))
}
