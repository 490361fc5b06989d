// Application state module
// Everything a request handler needs, shared by reference across connections

use std::sync::Arc;

use super::types::{ServerConfig, Settings};
use crate::content::ContentCache;

/// Application state
pub struct AppState {
    pub server: ServerConfig,
    pub settings: Settings,
    /// The virtual resource; the refresh source holds the other handle
    pub content: Arc<ContentCache>,
}

impl AppState {
    pub fn new(server: ServerConfig, settings: Settings, content: Arc<ContentCache>) -> Self {
        Self {
            server,
            settings,
            content,
        }
    }

    /// Whether per-request access logging is on
    pub const fn access_log(&self) -> bool {
        self.settings.logging.access_log
    }
}
