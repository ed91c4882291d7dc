pub mod auth;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::{resolve_identity, CurrentUser, MaybeUser};
pub use state::AppState;

/// Builds the `/api` router. Every route passes through identity resolution;
/// handlers that need a caller ask for it with the `CurrentUser` extractor.
pub fn router(app_state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/me", get(auth::me_handler))
        .route("/users", get(auth::list_users_handler));

    let text_routes = Router::new()
        .route("/", get(rest::list_texts_handler).post(rest::create_text_handler))
        .route("/me", get(rest::list_my_texts_handler))
        .route("/{id}", get(rest::get_text_handler).delete(rest::delete_text_handler))
        .route("/{id}/contributions", post(rest::add_contribution_handler))
        .route("/{id}/contributions/{cid}", delete(rest::delete_contribution_handler));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/texts", text_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            resolve_identity,
        ))
        .with_state(app_state)
}
