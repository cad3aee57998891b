//! HTTP API for docchat

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::render::Markup;
use crate::session::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    /// How answers are rendered in HTML views
    pub markup: Markup,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, markup: Markup) -> Self {
        Self { sessions, markup }
    }
}
