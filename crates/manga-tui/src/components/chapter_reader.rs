//! ChapterReader component — page image URLs of one chapter.

use manga_proto::protocol::ChapterImages;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_selected, C_LINK, C_LOADING, C_NUMBER_HINT, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

pub struct ChapterReader {
    manga: String,
    chapter: String,
    loading: bool,
    unavailable: bool,
    pages: ScrollableList<String>,
    list_state: ListState,
    heading: String,
}

impl ChapterReader {
    pub fn new() -> Self {
        Self {
            manga: String::new(),
            chapter: String::new(),
            loading: false,
            unavailable: false,
            pages: ScrollableList::new(|_: &String, _: &str| true),
            list_state: ListState::default(),
            heading: "reader".to_string(),
        }
    }

    pub fn open(&mut self, manga: &str, chapter: &str) {
        self.manga = manga.to_string();
        self.chapter = chapter.to_string();
        self.loading = true;
        self.unavailable = false;
        self.pages.set_items(Vec::new());
        self.heading = format!("{} · ch {}", manga, chapter);
    }

    /// Apply a `/chapterimages` result for (manga, chapter); anything else
    /// is stale and ignored.
    pub fn apply_images(
        &mut self,
        manga: &str,
        chapter: &str,
        result: Result<ChapterImages, String>,
    ) -> bool {
        if manga != self.manga || chapter != self.chapter {
            return false;
        }
        self.loading = false;
        match result {
            Ok(images) => self.pages.set_items(images.images),
            Err(_) => self.unavailable = true,
        }
        true
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn copy_selected(&self) -> Vec<Action> {
        self.pages
            .selected_item()
            .map(|url| vec![Action::CopyToClipboard(url.clone())])
            .unwrap_or_default()
    }
}

impl Default for ChapterReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ChapterReader {
    fn id(&self) -> ComponentId {
        ComponentId::ChapterReader
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.pages.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.pages.select_down(1),
            KeyCode::PageUp => self.pages.select_up(10),
            KeyCode::PageDown => self.pages.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.pages.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.pages.select_last(),
            KeyCode::Char('y') | KeyCode::Enter => return self.copy_selected(),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        match event.kind {
            MouseEventKind::ScrollUp => self.pages.select_up(1),
            MouseEventKind::ScrollDown => self.pages.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                self.pages.handle_click(rel_row);
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::OpenChapter { manga, chapter } = action {
            self.open(manga, chapter);
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let count = format!("{} pages", self.pages.len());
        let badge = if self.loading {
            Some(Badge { text: "LOADING", color: C_LOADING })
        } else if !self.pages.is_empty() {
            Some(Badge { text: count.as_str(), color: C_SECONDARY })
        } else {
            None
        };
        let block = pane_chrome(&self.heading, Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let empty_text = if self.manga.is_empty() {
            Some("  open a chapter from the detail screen")
        } else if self.loading {
            Some("  loading…")
        } else if self.unavailable {
            Some("  this chapter is unavailable right now")
        } else if self.pages.is_empty() {
            Some("  no pages")
        } else {
            None
        };
        if let Some(text) = empty_text {
            frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), inner);
            return;
        }

        let height = inner.height as usize;
        self.pages.ensure_visible(height);
        let sel = self.pages.selected_in_view(height);
        let items: Vec<ListItem> = self
            .pages
            .visible_items(height)
            .iter()
            .enumerate()
            .map(|(row, (idx, url))| {
                let style = if row == sel { style_selected(focused) } else { Style::default() };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {:>4} ", idx + 1), Style::default().fg(C_NUMBER_HINT)),
                    Span::styled(url.to_string(), Style::default().fg(C_LINK)),
                ]))
                .style(style)
            })
            .collect();
        self.list_state.select(Some(sel));
        frame.render_stateful_widget(List::new(items), inner, &mut self.list_state);
    }
}
