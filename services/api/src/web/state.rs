//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use text_review_core::ports::{CorrectionService, DatabaseService, TranslationService};
use text_review_core::{TextService, UserDirectory};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub texts: TextService,
    pub users: UserDirectory,
}

impl AppState {
    /// Wires the core services on top of the given adapters.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        corrector: Arc<dyn CorrectionService>,
        translator: Arc<dyn TranslationService>,
    ) -> Self {
        Self {
            texts: TextService::new(db.clone(), corrector, translator),
            users: UserDirectory::new(db.clone()),
            db,
            config,
        }
    }
}
