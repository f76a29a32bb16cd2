//! HTTP host for the single-page chat
//!
//! Serves the page and a small JSON API. The host owns session lifecycle;
//! each browser tab creates its own session on load.

mod assets;
mod handlers;
mod markdown;
mod types;

pub use handlers::create_router;

use crate::chat::ChatOrchestrator;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub chat: Arc<ChatOrchestrator>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(chat: ChatOrchestrator, max_upload_bytes: usize) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            chat: Arc::new(chat),
            max_upload_bytes,
        }
    }
}
