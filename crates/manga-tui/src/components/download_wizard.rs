//! DownloadWizard component — the step screens of the range wizard.
//!
//! Each step only asks for the wizard to move on (`Action::WizardAdvance`);
//! the actual transition happens in `on_action`, which also turns wizard
//! effects into `FetchTitleInfo` / `StartExport` actions for the App.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::warn;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_muted, style_secondary, style_selected, style_title, style_warning, C_CHAPTER,
        C_ERROR, C_LINK, C_LOADING, C_MUTED, C_NUMBER_HINT, C_PANEL_BORDER_FOCUSED,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
        scrollable_list::ScrollableList,
        text_input::{InputAction, TextInput},
    },
    wizard::{InfoLoaded, InfoState, RangeWizard, WizardEffect, STEP_END, STEP_START, STEP_TITLE},
};

const STEP_NAMES: [&str; 4] = ["title", "start chapter", "end chapter", "confirm"];

pub struct DownloadWizard {
    wizard: RangeWizard,
    title: TextInput,
    start_list: ScrollableList<String>,
    end_list: ScrollableList<String>,
    list_state: ListState,
    list_area: Rect,
}

impl DownloadWizard {
    pub fn new() -> Self {
        let mut title = TextInput::new("title: ", "type a manga title…");
        title.activate();
        Self {
            wizard: RangeWizard::new(),
            title,
            start_list: ScrollableList::new(|_: &String, _: &str| true),
            end_list: ScrollableList::new(|_: &String, _: &str| true),
            list_state: ListState::default(),
            list_area: Rect::default(),
        }
    }

    pub fn wizard(&self) -> &RangeWizard {
        &self.wizard
    }

    /// Apply the start step's chapter lookup.
    pub fn apply_info(&mut self, loaded: InfoLoaded) -> bool {
        let changed = self.wizard.apply_info(loaded);
        if changed {
            self.sync_lists();
        }
        changed
    }

    /// Rebuild both pickers from the wizard, keeping the current picks highlighted.
    fn sync_lists(&mut self) {
        let selection = self.wizard.selection();
        self.start_list.set_items(selection.chapters().to_vec());
        if let Some(start) = selection.start() {
            self.start_list.set_selected_by_original(start);
        }
        self.end_list.set_items(selection.end_domain().to_vec());
        if let Some(rel) = selection.end_relative() {
            self.end_list.set_selected_by_original(rel);
        }
    }

    fn after_step_change(&mut self) {
        if self.wizard.step() == STEP_TITLE {
            self.title.activate();
        } else {
            self.title.deactivate();
        }
        self.sync_lists();
    }

    fn pick_start(&mut self) {
        if let Some(idx) = self.start_list.selected_original_index() {
            if let Err(e) = self.wizard.select_start(idx) {
                warn!("wizard: {}", e);
            }
            self.sync_lists();
        }
    }

    fn pick_end(&mut self) {
        if let Some(rel) = self.end_list.selected_original_index() {
            if let Err(e) = self.wizard.select_end_relative(rel) {
                warn!("wizard: {}", e);
            }
        }
    }

    fn active_list(&mut self) -> Option<&mut ScrollableList<String>> {
        match self.wizard.step() {
            STEP_START => Some(&mut self.start_list),
            STEP_END => Some(&mut self.end_list),
            _ => None,
        }
    }

    fn draw_list(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        self.list_area = area;
        let (list, picked) = match self.wizard.step() {
            STEP_START => (&mut self.start_list, self.wizard.selection().start()),
            _ => (&mut self.end_list, self.wizard.selection().end_relative()),
        };

        let height = area.height as usize;
        list.ensure_visible(height);
        let sel = list.selected_in_view(height);
        let items: Vec<ListItem> = list
            .visible_items(height)
            .iter()
            .enumerate()
            .map(|(row, (idx, chapter))| {
                let marker = if picked == Some(*idx) { "● " } else { "  " };
                let style = if row == sel { style_selected(focused) } else { Style::default() };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {}", marker), Style::default().fg(C_PANEL_BORDER_FOCUSED)),
                    Span::styled("ch ", Style::default().fg(C_MUTED)),
                    Span::styled(chapter.to_string(), Style::default().fg(C_CHAPTER)),
                ]))
                .style(style)
            })
            .collect();
        self.list_state.select(Some(sel));
        frame.render_stateful_widget(List::new(items), area, &mut self.list_state);
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let selection = self.wizard.selection();
        let mut lines = vec![Line::from(vec![
            Span::styled(" title  ", style_muted()),
            Span::styled(self.wizard.name().trim().to_string(), style_title()),
        ])];
        if !self.wizard.cover().is_empty() {
            lines.push(Line::from(vec![
                Span::styled(" cover  ", style_muted()),
                Span::styled(self.wizard.cover().to_string(), Style::default().fg(C_LINK)),
            ]));
        }
        let pick = |idx: Option<usize>| {
            idx.and_then(|i| selection.chapters().get(i))
                .cloned()
                .unwrap_or_else(|| "-".to_string())
        };
        lines.push(Line::from(vec![
            Span::styled(" range  ", style_muted()),
            Span::styled(
                format!("{} → {}", pick(selection.start()), pick(selection.end())),
                Style::default().fg(C_CHAPTER),
            ),
        ]));
        match self.wizard.export_request() {
            Some(request) => {
                let file = request.file_name("pdf").unwrap_or_default();
                lines.push(Line::from(Span::styled(
                    format!(" {} chapters → {}", request.chapters.len(), state.downloads_dir().join(file).display()),
                    style_secondary(),
                )));
                lines.push(Line::from(Span::styled(" press Enter to export", style_muted())));
            }
            None => lines.push(Line::from(Span::styled(
                " pick a title, a start and an end chapter first",
                style_muted(),
            ))),
        }
        if let Some(saved) = &state.last_saved {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(" saved  ", style_muted()),
                Span::styled(saved.path.display().to_string(), Style::default().fg(C_LINK)),
                Span::styled(format!("  {}", saved.at.format("%H:%M:%S")), style_muted()),
            ]));
        }
        let text_h = (lines.len() as u16).min(area.height);
        frame.render_widget(Paragraph::new(lines), Rect { height: text_h, ..area });

        if let Some(export) = &state.active_export {
            let bar = Rect {
                x: area.x + 1,
                y: area.y + text_h,
                width: area.width.saturating_sub(2),
                height: 1,
            };
            if bar.y < area.y + area.height {
                let label = format!("{:>3.0}%", export.progress * 100.0);
                draw_progress(frame, bar, f64::from(export.progress), Some(&label));
            }
        }
    }
}

impl Default for DownloadWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for DownloadWizard {
    fn id(&self) -> ComponentId {
        ComponentId::DownloadWizard
    }

    fn is_editing(&self) -> bool {
        self.wizard.on_first_step()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        if self.wizard.on_first_step() {
            if !self.title.is_active() {
                self.title.activate();
            }
            return match self.title.handle_key(key) {
                InputAction::Changed(text) => {
                    self.wizard.set_name(text);
                    vec![]
                }
                InputAction::Confirmed => vec![Action::WizardAdvance],
                InputAction::Cancelled => vec![Action::Back],
            };
        }

        match key.code {
            KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => {
                return vec![Action::WizardRetreat];
            }
            KeyCode::Right | KeyCode::Char('l') if self.wizard.on_last_step() => {
                return vec![Action::WizardAdvance];
            }
            KeyCode::Enter => {
                match self.wizard.step() {
                    STEP_START => self.pick_start(),
                    STEP_END => self.pick_end(),
                    _ => {}
                }
                return vec![Action::WizardAdvance];
            }
            KeyCode::Char(' ') => match self.wizard.step() {
                STEP_START => self.pick_start(),
                STEP_END => self.pick_end(),
                _ => {}
            },
            _ => {}
        }

        if let Some(list) = self.active_list() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => list.select_up(1),
                KeyCode::Down | KeyCode::Char('j') => list.select_down(1),
                KeyCode::PageUp => list.select_up(10),
                KeyCode::PageDown => list.select_down(10),
                KeyCode::Home | KeyCode::Char('g') => list.select_first(),
                KeyCode::End | KeyCode::Char('G') => list.select_last(),
                _ => {}
            }
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        let area = self.list_area;
        let Some(list) = self.active_list() else {
            return vec![];
        };
        match event.kind {
            MouseEventKind::ScrollUp => list.select_up(1),
            MouseEventKind::ScrollDown => list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) if event.row >= area.y => {
                list.handle_click((event.row - area.y) as usize);
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::WizardAdvance => {
                if self.wizard.step() == STEP_TITLE {
                    self.wizard.set_name(self.title.text());
                }
                let effect = self.wizard.advance();
                self.after_step_change();
                match effect {
                    Some(WizardEffect::FetchInfo { title }) => vec![Action::FetchTitleInfo(title)],
                    Some(WizardEffect::Export(request)) => vec![Action::StartExport(request)],
                    None => vec![],
                }
            }
            Action::WizardRetreat => {
                self.wizard.retreat();
                self.after_step_change();
                vec![]
            }
            Action::PrefillDownload(title) if self.wizard.step() == STEP_TITLE => {
                self.title.set_value(title);
                self.wizard.set_name(title.clone());
                vec![]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let step = self.wizard.step();
        let badge_text = format!("step {}/{}", step, self.wizard.total_steps());
        let badge = if state.active_export.is_some() {
            Some(Badge { text: "EXPORTING", color: C_LOADING })
        } else {
            Some(Badge { text: badge_text.as_str(), color: C_NUMBER_HINT })
        };
        let block = pane_chrome("download", Some('d'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // step strip
                Constraint::Length(1), // status / warning
                Constraint::Min(1),    // body
            ])
            .split(inner);

        let mut strip = vec![Span::raw(" ")];
        for (i, name) in STEP_NAMES.iter().enumerate() {
            let style = if i + 1 == step {
                Style::default().fg(C_PANEL_BORDER_FOCUSED).add_modifier(Modifier::BOLD)
            } else {
                style_muted()
            };
            if i > 0 {
                strip.push(Span::styled(" › ", style_muted()));
            }
            strip.push(Span::styled(format!("{} {}", i + 1, name), style));
        }
        frame.render_widget(Paragraph::new(Line::from(strip)), rows[0]);

        let status = match (self.wizard.warning(), self.wizard.info_state()) {
            (Some(w), _) => Span::styled(format!(" ⚠ {}", w), style_warning()),
            (None, InfoState::Loading) if step != STEP_TITLE => {
                Span::styled(" loading chapters…", Style::default().fg(C_LOADING))
            }
            (None, InfoState::Failed(e)) if step != STEP_TITLE => {
                Span::styled(format!(" no chapters ({})", e), Style::default().fg(C_ERROR))
            }
            _ => Span::raw(""),
        };
        frame.render_widget(Paragraph::new(Line::from(status)), rows[1]);

        let body = rows[2];
        match step {
            STEP_TITLE => {
                let input = Rect { x: body.x + 1, width: body.width.saturating_sub(2), height: 1, ..body };
                self.title.draw(frame, input);
            }
            STEP_START | STEP_END => {
                let empty = if step == STEP_START {
                    self.start_list.is_empty()
                } else {
                    self.end_list.is_empty()
                };
                if empty {
                    self.list_area = Rect::default();
                    frame.render_widget(
                        Paragraph::new(Span::styled("  no chapters to pick from", style_muted())),
                        body,
                    );
                } else {
                    self.draw_list(frame, body, focused);
                }
            }
            _ => self.draw_confirm(frame, body, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::STEP_CONFIRM;
    use manga_proto::config::Config;
    use manga_proto::protocol::{ExportRequest, TitleInfo};
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Feed a key in and dispatch the resulting actions back, like the App.
    fn press(w: &mut DownloadWizard, state: &AppState, code: KeyCode) -> Vec<Action> {
        let mut out = Vec::new();
        for action in w.handle_key(key(code), state) {
            let follow = w.on_action(&action, state);
            out.push(action);
            out.extend(follow);
        }
        out
    }

    fn demo_info() -> InfoLoaded {
        InfoLoaded {
            title: "Demo".into(),
            result: Ok(TitleInfo {
                cover: String::new(),
                chapters: ["c1", "c2", "c3", "c4", "c5"].iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    #[test]
    fn test_full_walk_exports_range() {
        let state = AppState::new(Config::default());
        let mut w = DownloadWizard::new();
        assert!(w.is_editing());
        for c in "Demo".chars() {
            press(&mut w, &state, KeyCode::Char(c));
        }
        assert_eq!(
            press(&mut w, &state, KeyCode::Enter),
            vec![Action::WizardAdvance, Action::FetchTitleInfo("Demo".into())]
        );
        assert!(!w.is_editing());
        assert!(w.apply_info(demo_info()));

        press(&mut w, &state, KeyCode::Down);
        press(&mut w, &state, KeyCode::Enter);
        assert_eq!(w.wizard().step(), STEP_END);
        assert_eq!(w.end_list.len(), 4);

        press(&mut w, &state, KeyCode::Down);
        press(&mut w, &state, KeyCode::Down);
        press(&mut w, &state, KeyCode::Enter);
        assert_eq!(w.wizard().selection().end(), Some(3));
        assert_eq!(w.wizard().step(), STEP_CONFIRM);

        assert_eq!(
            press(&mut w, &state, KeyCode::Enter),
            vec![
                Action::WizardAdvance,
                Action::StartExport(ExportRequest {
                    title: "Demo".into(),
                    chapters: vec!["c2".into(), "c3".into(), "c4".into()],
                })
            ]
        );
    }

    #[test]
    fn test_repicking_start_shows_warning_and_blocks_export() {
        let state = AppState::new(Config::default());
        let mut w = DownloadWizard::new();
        w.on_action(&Action::PrefillDownload("Demo".into()), &state);
        press(&mut w, &state, KeyCode::Enter);
        w.apply_info(demo_info());

        for _ in 0..3 {
            press(&mut w, &state, KeyCode::Down);
        }
        press(&mut w, &state, KeyCode::Enter); // start c4
        press(&mut w, &state, KeyCode::Enter); // end c4
        assert_eq!(w.wizard().step(), STEP_CONFIRM);

        press(&mut w, &state, KeyCode::Backspace);
        press(&mut w, &state, KeyCode::Backspace);
        assert_eq!(w.wizard().step(), STEP_START);
        press(&mut w, &state, KeyCode::Down);
        press(&mut w, &state, KeyCode::Char(' ')); // start c5
        assert!(w.wizard().warning().is_some());

        press(&mut w, &state, KeyCode::Right);
        assert_eq!(w.wizard().step(), STEP_START, "right only advances on confirm");
        press(&mut w, &state, KeyCode::Enter);
        assert_eq!(w.wizard().step(), STEP_END);
        assert!(w.wizard().warning().is_some(), "old end is kept until re-picked");

        // skipping the end pick leaves the range inverted
        w.on_action(&Action::WizardAdvance, &state);
        assert_eq!(w.wizard().step(), STEP_CONFIRM);
        assert!(w.on_action(&Action::WizardAdvance, &state).is_empty());

        press(&mut w, &state, KeyCode::Left);
        press(&mut w, &state, KeyCode::Enter); // end c5
        assert!(w.wizard().warning().is_none());
        assert_eq!(
            press(&mut w, &state, KeyCode::Enter),
            vec![
                Action::WizardAdvance,
                Action::StartExport(ExportRequest {
                    title: "Demo".into(),
                    chapters: vec!["c5".into()],
                })
            ]
        );
    }

    #[test]
    fn test_escape_on_empty_title_goes_back() {
        let state = AppState::new(Config::default());
        let mut w = DownloadWizard::new();
        assert_eq!(w.handle_key(key(KeyCode::Esc), &state), vec![Action::Back]);
    }
}
