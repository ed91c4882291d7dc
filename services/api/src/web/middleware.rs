//! services/api/src/web/middleware.rs
//!
//! Authentication middleware and the extractors handlers use to read the caller.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use text_review_core::domain::Identity;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Reads the session token from the `session` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Middleware that resolves the caller's identity from the session token.
///
/// A valid session inserts an `Identity` into the request extensions. Requests
/// without one pass through untouched; handlers that need a caller reject them
/// via the `CurrentUser` extractor.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers()).map(str::to_owned);

    if let Some(token) = token {
        match state.db.validate_auth_session(&token).await {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(e) => debug!("Ignoring invalid auth session: {:?}", e),
        }
    }

    next.run(req).await
}

/// The authenticated caller. Rejects with 401 when there is none.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Unauthenticated".to_string()))
    }
}

/// The caller if one is authenticated; never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Identity>().copied()))
    }
}
