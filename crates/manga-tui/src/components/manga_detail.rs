//! MangaDetail component — one title's page with its chapter list.

use manga_proto::protocol::MangaPage;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, style_selected, style_title, C_CHAPTER, C_LINK, C_LOADING, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
        text_input::{InputAction, TextInput},
    },
};

#[derive(Debug, Clone, PartialEq)]
enum PageState {
    Empty,
    Loading,
    Loaded(MangaPage),
    Unavailable,
}

pub struct MangaDetail {
    /// Route slug the page was requested by.
    title: String,
    page: PageState,
    chapters: ScrollableList<String>,
    list_state: ListState,
    filter: TextInput,
    /// Rows of the chapter list as last drawn, for click hit-testing.
    list_area: Rect,
}

impl MangaDetail {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            page: PageState::Empty,
            chapters: ScrollableList::new(|c: &String, q: &str| {
                c.to_lowercase().contains(&q.to_lowercase())
            }),
            list_state: ListState::default(),
            filter: TextInput::new("/ ", "filter chapters…"),
            list_area: Rect::default(),
        }
    }

    /// Start showing `title`; the page arrives later through `apply_page`.
    pub fn open(&mut self, title: &str) {
        self.title = title.to_string();
        self.page = PageState::Loading;
        self.chapters.set_items(Vec::new());
        self.filter.clear();
        self.filter.deactivate();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Apply a `/mangapage` result. Results for another title are ignored.
    pub fn apply_page(&mut self, title: &str, result: Result<MangaPage, String>) -> bool {
        if title != self.title {
            return false;
        }
        match result {
            Ok(page) => {
                self.chapters.set_items(page.chapters.clone());
                self.page = PageState::Loaded(page);
            }
            Err(_) => {
                self.chapters.set_items(Vec::new());
                self.page = PageState::Unavailable;
            }
        }
        true
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    fn selected_chapter(&self) -> Option<Action> {
        let chapter = self.chapters.selected_item()?;
        Some(Action::OpenChapter {
            manga: self.title.clone(),
            chapter: chapter.clone(),
        })
    }
}

impl Default for MangaDetail {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for MangaDetail {
    fn id(&self) -> ComponentId {
        ComponentId::MangaDetail
    }

    fn is_editing(&self) -> bool {
        self.filter.is_active()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        if self.filter.is_active() {
            match key.code {
                KeyCode::Up => self.chapters.select_up(1),
                KeyCode::Down => self.chapters.select_down(1),
                _ => match self.filter.handle_key(key) {
                    InputAction::Changed(q) => self.chapters.set_filter(&q),
                    InputAction::Confirmed => {
                        self.filter.deactivate();
                        return vec![Action::CloseInput];
                    }
                    InputAction::Cancelled => {
                        self.chapters.set_filter("");
                        return vec![Action::CloseInput];
                    }
                },
            }
            return vec![];
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 5 } else { 1 };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.chapters.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.chapters.select_down(step),
            KeyCode::PageUp => self.chapters.select_up(10),
            KeyCode::PageDown => self.chapters.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.chapters.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.chapters.select_last(),
            KeyCode::Enter => return self.selected_chapter().into_iter().collect(),
            KeyCode::Char('/') => {
                self.filter.activate();
                return vec![Action::OpenInput];
            }
            KeyCode::Char('d') if !self.title.is_empty() => {
                let name = match &self.page {
                    PageState::Loaded(page) if !page.name.is_empty() => page.name.clone(),
                    _ => self.title.clone(),
                };
                return vec![Action::PrefillDownload(name)];
            }
            KeyCode::Char('y') => {
                if let PageState::Loaded(page) = &self.page {
                    if !page.image.is_empty() {
                        return vec![Action::CopyToClipboard(page.image.clone())];
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.chapters.select_up(1),
            MouseEventKind::ScrollDown => self.chapters.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let r = self.list_area;
                if event.row >= r.y && event.row < r.y + r.height && event.column >= r.x {
                    let row = (event.row - r.y) as usize;
                    let was = self.chapters.selected;
                    if self.chapters.handle_click(row) && was == self.chapters.selected {
                        return self.selected_chapter().into_iter().collect();
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::OpenManga(title) = action {
            self.open(title);
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let badge = match self.page {
            PageState::Loading => Some(Badge { text: "LOADING", color: C_LOADING }),
            _ => None,
        };
        let title = if self.title.is_empty() { "detail" } else { self.title.as_str() };
        let block = pane_chrome(title, Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.list_area = Rect::default();

        let page = match &self.page {
            PageState::Empty => {
                frame.render_widget(
                    Paragraph::new(Span::styled("  pick a title on the browse screen", style_muted())),
                    inner,
                );
                return;
            }
            PageState::Loading => {
                frame.render_widget(Paragraph::new(Span::styled("  loading…", style_muted())), inner);
                return;
            }
            PageState::Unavailable => {
                frame.render_widget(
                    Paragraph::new(Span::styled("  this title is unavailable right now", style_muted())),
                    inner,
                );
                return;
            }
            PageState::Loaded(page) => page.clone(),
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(" "),
                Span::styled(page.name.clone(), style_title()),
                Span::styled(format!("  {} chapters", page.chapters.len()), style_secondary()),
            ])),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(page.description.clone(), style_secondary()))
                .wrap(Wrap { trim: true }),
            Rect { x: rows[1].x + 1, width: rows[1].width.saturating_sub(2), ..rows[1] },
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" cover ", style_muted()),
                Span::styled(page.image.clone(), Style::default().fg(C_LINK)),
            ])),
            rows[2],
        );

        let mut list_area = rows[3];
        if self.filter.is_active() || !self.chapters.filter.is_empty() {
            let filter_area = Rect {
                y: list_area.y + list_area.height.saturating_sub(1),
                height: 1,
                ..list_area
            };
            self.filter.draw(frame, filter_area);
            list_area.height = list_area.height.saturating_sub(1);
        }
        self.list_area = list_area;

        if self.chapters.is_empty() {
            let text = if page.chapters.is_empty() { "  no chapters" } else { "  no chapters match filter" };
            frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), list_area);
            return;
        }

        let height = list_area.height as usize;
        self.chapters.ensure_visible(height);
        let sel = self.chapters.selected_in_view(height);
        let items: Vec<ListItem> = self
            .chapters
            .visible_items(height)
            .iter()
            .enumerate()
            .map(|(row, (_, chapter))| {
                let style = if row == sel { style_selected(focused) } else { Style::default() };
                ListItem::new(Line::from(vec![
                    Span::styled("  ch ", Style::default().fg(C_SECONDARY)),
                    Span::styled(chapter.to_string(), Style::default().fg(C_CHAPTER)),
                ]))
                .style(style)
            })
            .collect();
        self.list_state.select(Some(sel));
        frame.render_stateful_widget(List::new(items), list_area, &mut self.list_state);
    }
}
