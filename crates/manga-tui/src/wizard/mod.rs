//! RangeWizard — title → start chapter → end chapter → confirm.
//!
//! The wizard is a plain state machine. Side effects are handed back to the
//! caller as `WizardEffect`s:
//!
//! - entering step 2 asks for the title's chapter list (`FetchInfo`);
//! - advancing from step 4 asks for the export (`Export`), but only when the
//!   accumulated state passes the final-action guard.
//!
//! Hook results come back through `apply_info`. A failed lookup leaves the
//! wizard on its step with an empty chapter list; nothing is rolled back.

pub mod range;
pub mod stepper;

use manga_proto::catalog::CatalogClient;
use manga_proto::protocol::{ExportRequest, TitleInfo};
use tracing::{debug, info, warn};

pub use range::{RangeError, RangeSelection, RangeValidation};
pub use stepper::{StepChange, Stepper};

pub const STEP_TITLE: usize = 1;
pub const STEP_START: usize = 2;
pub const STEP_END: usize = 3;
pub const STEP_CONFIRM: usize = 4;
pub const STEP_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    /// On-enter hook for the start step.
    FetchInfo { title: String },
    /// Completion hook of the last step.
    Export(ExportRequest),
}

/// Outcome of a `FetchInfo` hook, tagged with the title it was run for.
#[derive(Debug, Clone)]
pub struct InfoLoaded {
    pub title: String,
    pub result: Result<TitleInfo, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfoState {
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RangeWizard {
    stepper: Stepper,
    name: String,
    info: InfoState,
    cover: String,
    selection: RangeSelection,
    /// Title the current chapter list belongs to.
    loaded_for: Option<String>,
}

impl RangeWizard {
    pub fn new() -> Self {
        Self {
            stepper: Stepper::new(STEP_COUNT, STEP_TITLE),
            name: String::new(),
            info: InfoState::NotLoaded,
            cover: String::new(),
            selection: RangeSelection::default(),
            loaded_for: None,
        }
    }

    pub fn step(&self) -> usize {
        self.stepper.current()
    }

    pub fn total_steps(&self) -> usize {
        self.stepper.total()
    }

    /// On the title step, where keys go to the text field.
    pub fn on_first_step(&self) -> bool {
        self.stepper.is_first()
    }

    /// On the confirm step, where advancing runs the export.
    pub fn on_last_step(&self) -> bool {
        self.stepper.is_last()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn title(&self) -> &str {
        self.name.trim()
    }

    pub fn info_state(&self) -> &InfoState {
        &self.info
    }

    pub fn cover(&self) -> &str {
        &self.cover
    }

    pub fn selection(&self) -> &RangeSelection {
        &self.selection
    }

    pub fn select_start(&mut self, index: usize) -> Result<(), RangeError> {
        self.selection.select_start(index)
    }

    pub fn select_end_relative(&mut self, relative: usize) -> Result<usize, RangeError> {
        self.selection.select_end_relative(relative)
    }

    pub fn warning(&self) -> Option<String> {
        self.selection.warning()
    }

    pub fn advance(&mut self) -> Option<WizardEffect> {
        match self.stepper.advance() {
            StepChange::Moved { from, to } => {
                debug!("wizard: step {} -> {}", from, to);
                self.on_enter(to)
            }
            StepChange::Completed => self.on_complete(),
            StepChange::Blocked => None,
        }
    }

    pub fn retreat(&mut self) {
        if let StepChange::Moved { from, to } = self.stepper.retreat() {
            debug!("wizard: step {} -> {}", from, to);
        }
    }

    fn on_enter(&mut self, step: usize) -> Option<WizardEffect> {
        if step != STEP_START {
            return None;
        }
        let title = self.title().to_string();
        if self.loaded_for.as_deref() != Some(title.as_str()) {
            self.clear_chapters();
        }
        if title.is_empty() {
            self.info = InfoState::Failed("no title entered".to_string());
            return None;
        }
        self.info = InfoState::Loading;
        Some(WizardEffect::FetchInfo { title })
    }

    fn on_complete(&mut self) -> Option<WizardEffect> {
        match self.export_request() {
            Some(request) => {
                info!(
                    "wizard: exporting {} chapters of {}",
                    request.chapters.len(),
                    request.title
                );
                Some(WizardEffect::Export(request))
            }
            None => {
                warn!(
                    "wizard: export refused (title={:?}, range={:?})",
                    self.title(),
                    self.selection.validation()
                );
                None
            }
        }
    }

    fn clear_chapters(&mut self) {
        self.selection.set_chapters(Vec::new());
        self.cover.clear();
        self.loaded_for = None;
    }

    /// Final-action guard: a title whose chapter list has loaded, both
    /// picks, and end >= start.
    pub fn export_request(&self) -> Option<ExportRequest> {
        let title = self.title();
        if title.is_empty()
            || self.info != InfoState::Loaded
            || self.loaded_for.as_deref() != Some(title)
        {
            return None;
        }
        let chapters = self.selection.selected()?;
        Some(ExportRequest {
            title: title.to_string(),
            chapters: chapters.to_vec(),
        })
    }

    /// Apply a `FetchInfo` result. Results for a title other than the one
    /// currently entered are dropped. Returns whether anything changed.
    pub fn apply_info(&mut self, loaded: InfoLoaded) -> bool {
        if loaded.title != self.title() {
            debug!(
                "wizard: dropping info for {:?} (current title {:?})",
                loaded.title,
                self.title()
            );
            return false;
        }
        match loaded.result {
            Ok(info) => {
                if info.chapters.as_slice() != self.selection.chapters() {
                    self.selection.set_chapters(info.chapters);
                }
                self.cover = info.cover;
                self.loaded_for = Some(loaded.title);
                self.info = InfoState::Loaded;
            }
            Err(e) => {
                warn!("wizard: info lookup for {:?} failed: {}", loaded.title, e);
                self.clear_chapters();
                self.info = InfoState::Failed(e);
            }
        }
        true
    }
}

impl Default for RangeWizard {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the start step's on-enter hook.
pub async fn fetch_info(client: &CatalogClient, title: String) -> InfoLoaded {
    let result = client.info(&title).await.map_err(|e| e.to_string());
    InfoLoaded { title, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_catalog, ExportMode};

    fn chapters() -> TitleInfo {
        TitleInfo {
            cover: "http://img/demo.jpg".to_string(),
            chapters: ["c1", "c2", "c3", "c4", "c5"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn loaded(title: &str) -> InfoLoaded {
        InfoLoaded {
            title: title.to_string(),
            result: Ok(chapters()),
        }
    }

    fn at_start_step(title: &str) -> RangeWizard {
        let mut w = RangeWizard::new();
        w.set_name(title);
        let effect = w.advance();
        assert_eq!(
            effect,
            Some(WizardEffect::FetchInfo {
                title: title.trim().to_string()
            })
        );
        assert!(w.apply_info(loaded(title.trim())));
        w
    }

    #[test]
    fn test_valid_range_exports() {
        let mut w = at_start_step("Demo");
        assert_eq!(w.step(), STEP_START);
        w.select_start(1).unwrap();
        assert_eq!(w.advance(), None);
        assert_eq!(w.step(), STEP_END);
        assert_eq!(w.select_end_relative(2), Ok(3));
        assert_eq!(w.warning(), None);
        assert_eq!(w.advance(), None);
        assert_eq!(w.step(), STEP_CONFIRM);

        let effect = w.advance();
        assert_eq!(
            effect,
            Some(WizardEffect::Export(ExportRequest {
                title: "Demo".to_string(),
                chapters: vec!["c2".into(), "c3".into(), "c4".into()],
            }))
        );
        assert_eq!(w.step(), STEP_CONFIRM);
    }

    #[test]
    fn test_inverted_range_warns_but_navigates() {
        let mut w = at_start_step("Demo");
        w.select_start(3).unwrap();
        w.advance();
        assert_eq!(w.select_end_relative(0), Ok(3));
        assert_eq!(w.warning(), None);

        w.retreat();
        assert_eq!(w.step(), STEP_START);
        w.select_start(4).unwrap();
        assert!(w.warning().is_some());

        w.advance();
        w.advance();
        assert_eq!(w.step(), STEP_CONFIRM);
        assert!(w.warning().is_some());
        assert_eq!(w.advance(), None);
        assert_eq!(w.step(), STEP_CONFIRM);
    }

    #[test]
    fn test_export_refused_without_title_or_picks() {
        let mut w = RangeWizard::new();
        assert_eq!(w.advance(), None);
        assert_eq!(w.info_state(), &InfoState::Failed("no title entered".into()));
        w.advance();
        w.advance();
        assert_eq!(w.step(), STEP_CONFIRM);
        assert_eq!(w.advance(), None);

        let mut w = at_start_step("Demo");
        w.select_start(0).unwrap();
        w.advance();
        w.advance();
        assert_eq!(w.advance(), None);
    }

    #[test]
    fn test_failed_lookup_degrades_without_rollback() {
        let mut w = RangeWizard::new();
        w.set_name("Demo");
        w.advance();
        assert_eq!(w.info_state(), &InfoState::Loading);
        assert!(w.apply_info(InfoLoaded {
            title: "Demo".into(),
            result: Err("connection refused".into()),
        }));
        assert_eq!(w.step(), STEP_START);
        assert!(w.selection().chapters().is_empty());
        assert!(matches!(w.info_state(), InfoState::Failed(_)));
    }

    #[test]
    fn test_result_for_other_title_is_dropped() {
        let mut w = RangeWizard::new();
        w.set_name("Berserk");
        w.advance();
        w.retreat();
        w.set_name("Demo");
        w.advance();

        assert!(!w.apply_info(loaded("Berserk")));
        assert!(w.selection().chapters().is_empty());
        assert!(w.apply_info(loaded("Demo")));
        assert_eq!(w.selection().chapters().len(), 5);
    }

    #[test]
    fn test_new_title_drops_previous_chapters() {
        let mut w = at_start_step("Berserk");
        w.retreat();
        w.set_name("Demo");
        assert_eq!(
            w.advance(),
            Some(WizardEffect::FetchInfo { title: "Demo".into() })
        );
        assert_eq!(w.info_state(), &InfoState::Loading);
        assert!(w.selection().chapters().is_empty());
        assert_eq!(w.cover(), "");
        assert!(w.select_start(0).is_err());

        w.advance();
        w.advance();
        assert_eq!(w.step(), STEP_CONFIRM);
        assert_eq!(w.advance(), None);
    }

    #[test]
    fn test_export_waits_for_refetch_of_same_title() {
        let mut w = at_start_step("Demo");
        w.select_start(1).unwrap();
        w.advance();
        w.select_end_relative(1).unwrap();
        w.retreat();
        w.retreat();
        w.advance();
        assert_eq!(w.info_state(), &InfoState::Loading);
        assert_eq!(w.selection().start(), Some(1));
        assert_eq!(w.export_request(), None);

        assert!(w.apply_info(loaded("Demo")));
        assert_eq!(
            w.export_request(),
            Some(ExportRequest {
                title: "Demo".into(),
                chapters: vec!["c2".into(), "c3".into()],
            })
        );
    }

    #[test]
    fn test_refetch_same_list_keeps_picks() {
        let mut w = at_start_step("Demo");
        w.select_start(2).unwrap();
        w.retreat();
        w.advance();
        assert!(w.apply_info(loaded("Demo")));
        assert_eq!(w.selection().start(), Some(2));
    }

    #[test]
    fn test_retreat_from_first_step_is_noop() {
        let mut w = RangeWizard::new();
        w.retreat();
        assert_eq!(w.step(), STEP_TITLE);
    }

    #[tokio::test]
    async fn test_hook_against_catalog_and_no_export_on_invalid_range() {
        let (base, hits) = spawn_catalog(ExportMode::Pdf).await;
        let client = CatalogClient::new(base);

        let mut w = RangeWizard::new();
        w.set_name("Demo");
        let Some(WizardEffect::FetchInfo { title }) = w.advance() else {
            panic!("expected info lookup");
        };
        let loaded = fetch_info(&client, title).await;
        assert!(w.apply_info(loaded));
        assert_eq!(w.selection().chapters().len(), 5);

        w.select_start(3).unwrap();
        w.advance();
        w.select_end_relative(0).unwrap();
        w.retreat();
        w.select_start(4).unwrap();
        w.advance();
        w.advance();

        assert!(w.warning().is_some());
        assert_eq!(w.advance(), None);
        assert_eq!(hits.export_count(), 0);
    }

    #[tokio::test]
    async fn test_hook_failure_is_degraded() {
        let client = CatalogClient::new("http://127.0.0.1:9");
        let loaded = fetch_info(&client, "Demo".to_string()).await;
        assert!(loaded.result.is_err());

        let mut w = RangeWizard::new();
        w.set_name("Demo");
        w.advance();
        w.apply_info(loaded);
        assert_eq!(w.step(), STEP_START);
        assert!(w.selection().chapters().is_empty());
    }
}
