//! Per-session view state: the active filter and the clipboard mark.
//!
//! Sessions are owned by the caller and passed into the service, so there is
//! no hidden global "current mark".

use crate::models::SiteId;
use crate::services::clipboard::Clipboard;
use crate::services::move_validator::ViewMode;

#[derive(Debug, Clone)]
pub struct ViewSession {
    site_id: SiteId,
    filter: Option<String>,
    clipboard: Clipboard,
}

impl ViewSession {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            filter: None,
            clipboard: Clipboard::new(),
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Activate a text filter; blank queries clear it
    pub fn set_filter(&mut self, query: &str) {
        let query = query.trim();
        self.filter = if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        };
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.filter.is_some() {
            ViewMode::Filtered
        } else {
            ViewMode::Full
        }
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }
}
