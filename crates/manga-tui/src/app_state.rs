//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this, but never mutate it. The App event-loop is the
//! only thing that writes to AppState.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use manga_proto::config::Config;

use crate::action::Screen;
use crate::widgets::status_bar::InputMode;

/// An export in flight, for the wizard's confirm step.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveExport {
    pub key: String,
    pub progress: f32,
}

/// The last export that reached the disk.
#[derive(Debug, Clone)]
pub struct SavedExport {
    pub path: PathBuf,
    pub at: DateTime<Local>,
}

pub struct AppState {
    pub screen: Screen,
    pub input_mode: InputMode,
    pub config: Config,

    // ── Catalog ─────────────────────────────────────────────────────────────
    /// Last transient failure per view; the view itself stays empty.
    pub featured_error: Option<String>,
    pub popular_error: Option<String>,

    // ── Exports ─────────────────────────────────────────────────────────────
    pub active_export: Option<ActiveExport>,
    pub last_saved: Option<SavedExport>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            screen: Screen::Browse,
            input_mode: InputMode::Normal,
            config,
            featured_error: None,
            popular_error: None,
            active_export: None,
            last_saved: None,
        }
    }

    pub fn downloads_dir(&self) -> &PathBuf {
        &self.config.paths.downloads_dir
    }
}
