//! Action enum — all user-initiated intents and internal events.

use manga_proto::protocol::ExportRequest;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Carousel,
    PopularStrip,
    MangaDetail,
    ChapterReader,
    DownloadWizard,
    HelpOverlay,
}

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse,
    Detail,
    Reader,
    Download,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Detail => "detail",
            Self::Reader => "reader",
            Self::Download => "download",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Self::Browse => '1',
            Self::Detail => '2',
            Self::Reader => '3',
            Self::Download => 'd',
        }
    }

    pub const ALL: [Screen; 4] = [Self::Browse, Self::Detail, Self::Reader, Self::Download];
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Carousel ─────────────────────────────────────────────────────────────
    CarouselNext,
    CarouselPrev,
    CarouselJump(usize), // absolute index from the thumbnail ring

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    SwitchScreen(Screen),
    Back,
    /// Open a title's page by its route slug.
    OpenManga(String),
    OpenChapter { manga: String, chapter: String },

    // ── Download wizard ──────────────────────────────────────────────────────
    /// Request from the active step to move forward.
    WizardAdvance,
    WizardRetreat,
    /// Pre-fill the wizard's title (from the detail screen).
    PrefillDownload(String),
    FetchTitleInfo(String),
    StartExport(ExportRequest),

    // ── UI ───────────────────────────────────────────────────────────────────
    OpenInput,
    CloseInput,
    ToggleHelp,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
