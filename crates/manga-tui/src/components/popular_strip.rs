//! PopularStrip — endless horizontal row of popular titles.
//!
//! The strip scrolls in terminal cells. Every scroll goes through
//! `observe`, which rebuilds the metrics from the current list and card
//! size and lets the `ScrollLoop` rewrite the offset at either edge.

use manga_proto::config::PopularConfig;
use manga_proto::protocol::{title_slug, PopularManga};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::trace;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::carousel_view::truncate,
    scroll_loop::{ScrollLoop, ScrollMetrics},
    theme::{style_muted, C_CHAPTER, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::pane_chrome::pane_chrome,
};

/// Viewport assumed until the first draw reports the real one.
const DEFAULT_VIEWPORT: u16 = 80;

pub struct PopularStrip {
    strip: ScrollLoop<PopularManga>,
    offset: f64,
    viewport: u16,
    card_width: u16,
    card_gap: u16,
    /// Last-drawn card areas with their logical index.
    card_areas: Vec<(Rect, usize)>,
}

impl PopularStrip {
    pub fn new(config: &PopularConfig) -> Self {
        Self {
            strip: ScrollLoop::new(config.edge_tolerance),
            offset: 0.0,
            viewport: DEFAULT_VIEWPORT,
            card_width: config.card_width.max(8),
            card_gap: config.card_gap,
            card_areas: Vec::new(),
        }
    }

    pub fn set_popular(&mut self, items: Vec<PopularManga>) {
        self.strip.set_items(items);
        self.offset = 0.0;
    }

    pub fn items(&self) -> &[PopularManga] {
        self.strip.items()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn pitch(&self) -> f64 {
        f64::from(self.card_width) + f64::from(self.card_gap)
    }

    /// Width of the doubled strip, from the list as it is right now.
    fn total_width(&self) -> f64 {
        self.strip.rendered_len() as f64 * self.pitch()
    }

    /// Step-button distance.
    pub fn step(&self) -> f64 {
        f64::from(self.viewport) / 1.5
    }

    pub fn set_viewport(&mut self, width: u16) {
        self.viewport = width;
    }

    /// Scroll by `delta` cells, clamped to the content, then observe.
    pub fn scroll_by(&mut self, delta: f64) {
        let max = (self.total_width() - f64::from(self.viewport)).max(0.0);
        self.offset = (self.offset + delta).clamp(0.0, max);
        self.observe();
    }

    fn observe(&mut self) {
        let metrics = ScrollMetrics {
            offset: self.offset,
            viewport: f64::from(self.viewport),
            total: self.total_width(),
        };
        if let Some(corrected) = self.strip.correct(metrics) {
            trace!("popular: offset {:.1} -> {:.1}", self.offset, corrected);
            self.offset = corrected;
        }
    }

    /// Logical index of the first card fully inside the viewport.
    pub fn highlighted(&self) -> Option<usize> {
        let len = self.strip.logical_len();
        if len == 0 {
            return None;
        }
        let first = (self.offset / self.pitch()).ceil() as usize;
        Some(first % len)
    }

    fn open(&self, logical: usize) -> Vec<Action> {
        self.strip
            .items()
            .get(logical)
            .map(|m| vec![Action::OpenManga(title_slug(&m.name))])
            .unwrap_or_default()
    }
}

impl Component for PopularStrip {
    fn id(&self) -> ComponentId {
        ComponentId::PopularStrip
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.scroll_by(-self.step()),
            KeyCode::Right | KeyCode::Char('l') => self.scroll_by(self.step()),
            KeyCode::Enter => {
                if let Some(idx) = self.highlighted() {
                    return self.open(idx);
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollDown | MouseEventKind::ScrollRight => self.scroll_by(self.pitch()),
            MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft => self.scroll_by(-self.pitch()),
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = self.card_areas.iter().find(|(r, _)| {
                    event.column >= r.x
                        && event.column < r.x + r.width
                        && event.row >= r.y
                        && event.row < r.y + r.height
                });
                if let Some((_, idx)) = hit {
                    return self.open(*idx);
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("popular", None, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.card_areas.clear();
        self.viewport = inner.width;

        if self.strip.is_empty() {
            let text = match &state.popular_error {
                Some(_) => "  popular titles unavailable",
                None => "  loading popular titles…",
            };
            frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), inner);
            return;
        }

        let highlighted = if focused { self.highlighted() } else { None };
        let offset = self.offset.round() as i64;
        let view = i64::from(inner.width);
        let card_w = i64::from(self.card_width);
        let pitch = self.pitch() as i64;

        for (slot, (logical, manga)) in self.strip.rendered().enumerate() {
            let x0 = slot as i64 * pitch - offset;
            if x0 + card_w <= 0 {
                continue;
            }
            if x0 >= view {
                break;
            }
            let start = x0.max(0);
            let end = (x0 + card_w).min(view);
            let card = Rect {
                x: inner.x + start as u16,
                y: inner.y,
                width: (end - start) as u16,
                height: inner.height,
            };
            let skip = (start - x0) as u16;

            let text_w = self.card_width.saturating_sub(2) as usize;
            let latest = manga.chapters.first().map(String::as_str).unwrap_or("-");
            let lines = vec![
                Line::from(Span::styled(
                    format!(" {}", truncate(&manga.name, text_w)),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!(" {} chapters", manga.chapters.len()),
                    Style::default().fg(C_SECONDARY),
                )),
                Line::from(Span::styled(
                    format!(" latest {}", truncate(latest, text_w.saturating_sub(7))),
                    Style::default().fg(C_CHAPTER),
                )),
            ];
            let bg = if highlighted == Some(logical) && x0 >= 0 {
                Style::default().bg(C_SELECTION_BG).add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(C_SELECTION_BG)
            };
            frame.render_widget(Paragraph::new(lines).style(bg).scroll((0, skip)), card);
            self.card_areas.push((card, logical));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manga(name: &str) -> PopularManga {
        PopularManga {
            image: String::new(),
            name: name.to_string(),
            chapters: vec!["12".into(), "11".into()],
        }
    }

    /// 4 cards of pitch 10 -> doubled strip of 80 cells, viewport 30.
    fn strip() -> PopularStrip {
        let mut s = PopularStrip::new(&PopularConfig {
            edge_tolerance: 5.0,
            card_width: 8,
            card_gap: 2,
        });
        s.set_popular(vec![manga("a"), manga("b"), manga("c"), manga("d")]);
        s.set_viewport(30);
        s
    }

    #[test]
    fn test_oversized_cards_from_config_do_not_overflow() {
        let mut s = PopularStrip::new(&PopularConfig {
            edge_tolerance: 5.0,
            card_width: u16::MAX,
            card_gap: u16::MAX,
        });
        s.set_popular(vec![manga("a"), manga("b")]);
        s.set_viewport(30);
        assert_eq!(s.pitch(), 2.0 * f64::from(u16::MAX));
        s.scroll_by(s.step());
        assert_eq!(s.offset(), 20.0);
        assert!(s.highlighted().is_some());
    }

    #[test]
    fn test_step_is_two_thirds_of_viewport() {
        let s = strip();
        assert_eq!(s.step(), 20.0);
    }

    #[test]
    fn test_scrolling_back_from_start_lands_in_second_copy() {
        let mut s = strip();
        s.scroll_by(-s.step());
        assert_eq!(s.offset(), 40.0);
        assert_eq!(s.highlighted(), Some(0));
    }

    #[test]
    fn test_scrolling_past_tail_wraps_to_start() {
        let mut s = strip();
        s.scroll_by(20.0);
        assert_eq!(s.offset(), 20.0);
        s.scroll_by(20.0);
        assert_eq!(s.offset(), 40.0);
        // clamped to 50, and 50 + 30 >= 80 - 5
        s.scroll_by(20.0);
        assert_eq!(s.offset(), 0.0);
    }

    #[test]
    fn test_total_follows_current_list() {
        let mut s = strip();
        s.scroll_by(20.0);
        s.set_popular(vec![manga("a"), manga("b"), manga("c"), manga("d"), manga("e"), manga("f")]);
        assert_eq!(s.offset(), 0.0);
        // doubled strip is now 120 cells; 60 is an interior offset
        s.scroll_by(60.0);
        assert_eq!(s.offset(), 60.0);
        assert_eq!(s.highlighted(), Some(0));
    }

    #[test]
    fn test_enter_opens_highlighted_card() {
        let state = AppState::new(manga_proto::config::Config::default());
        let mut s = strip();
        s.scroll_by(13.0);
        assert_eq!(s.highlighted(), Some(2));
        let key = KeyEvent::new(KeyCode::Enter, ratatui::crossterm::event::KeyModifiers::NONE);
        assert_eq!(s.handle_key(key, &state), vec![Action::OpenManga("c".into())]);
    }

    #[test]
    fn test_empty_strip_stays_put() {
        let mut s = PopularStrip::new(&PopularConfig::default());
        s.scroll_by(-50.0);
        assert_eq!(s.offset(), 0.0);
        assert_eq!(s.highlighted(), None);
    }
}
