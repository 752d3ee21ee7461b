//! CarouselView — featured titles, one at a time, advancing on a timer.
//!
//! Owns the `CyclicSelector` (cursor) and the `AutoAdvance` schedule. The
//! App arms the schedule through `sync_timer` whenever a new featured list
//! is installed, and disarms it when the browse screen is left.

use std::time::Duration;

use manga_proto::protocol::{title_slug, FeaturedItem};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    carousel::{AutoAdvance, CarouselTick, CyclicSelector},
    component::Component,
    theme::{style_muted, style_secondary, style_title, C_LINK, C_LOADING, C_SECONDARY, C_SELECTION_BG},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
    },
};

pub struct CarouselView {
    selector: CyclicSelector<FeaturedItem>,
    timer: AutoAdvance,
    window: usize,
    /// Last-drawn hit areas: prev/next buttons and (area, absolute index) thumbnails.
    prev_area: Rect,
    next_area: Rect,
    thumb_areas: Vec<(Rect, usize)>,
}

impl CarouselView {
    pub fn new(period: Duration, window: usize) -> Self {
        Self {
            selector: CyclicSelector::new(),
            timer: AutoAdvance::new(period),
            window,
            prev_area: Rect::default(),
            next_area: Rect::default(),
            thumb_areas: Vec::new(),
        }
    }

    /// Install a freshly fetched list. Always a new list identity.
    pub fn set_featured(&mut self, items: Vec<FeaturedItem>) -> u64 {
        let identity = self.selector.set_items(items);
        debug!(
            "carousel: list #{} with {} items",
            identity,
            self.selector.len()
        );
        identity
    }

    /// Bring the auto-advance schedule in line with the current list.
    pub fn sync_timer<M, F>(&mut self, tx: &mpsc::Sender<M>, wrap: F)
    where
        M: Send + 'static,
        F: Fn(CarouselTick) -> M + Send + 'static,
    {
        self.timer
            .sync(self.selector.generation(), self.selector.len(), tx, wrap);
    }

    pub fn disarm(&mut self) {
        self.timer.disarm();
    }

    /// Apply a timer tick. Returns whether the carousel moved.
    pub fn on_tick(&mut self, tick: CarouselTick) -> bool {
        if self.timer.accept(tick) {
            self.selector.next();
            true
        } else {
            debug!("carousel: dropping stale tick for list #{}", tick.identity);
            false
        }
    }

    pub fn timer(&self) -> &AutoAdvance {
        &self.timer
    }

    pub fn selector(&self) -> &CyclicSelector<FeaturedItem> {
        &self.selector
    }

    pub fn current(&self) -> Option<&FeaturedItem> {
        self.selector.current()
    }

    fn draw_thumbnails(&mut self, frame: &mut Frame, area: Rect) {
        self.thumb_areas.clear();
        let upcoming: Vec<(usize, String)> = self
            .selector
            .upcoming(self.window)
            .into_iter()
            .map(|(idx, item)| (idx, item.title.clone()))
            .collect();
        if upcoming.is_empty() || area.width == 0 {
            return;
        }

        let label = "up next ";
        frame.render_widget(
            Paragraph::new(Span::styled(label, style_muted())),
            Rect { width: (label.len() as u16).min(area.width), ..area },
        );

        let mut x = area.x + label.len() as u16;
        let right = area.x + area.width;
        let slot = ((area.width.saturating_sub(label.len() as u16)) / upcoming.len() as u16).max(6);
        for (idx, title) in upcoming {
            if x + 4 > right {
                break;
            }
            let width = slot.min(right - x);
            let text = format!(" {} ", truncate(&title, width.saturating_sub(3) as usize));
            let thumb = Rect { x, y: area.y, width: width.saturating_sub(1), height: 1 };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    text,
                    Style::default().fg(C_SECONDARY).bg(C_SELECTION_BG),
                )),
                thumb,
            );
            self.thumb_areas.push((thumb, idx));
            x += width;
        }
    }
}

impl Component for CarouselView {
    fn id(&self) -> ComponentId {
        ComponentId::Carousel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::CarouselPrev],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::CarouselNext],
            KeyCode::Enter => match self.selector.current() {
                Some(item) => vec![Action::OpenManga(title_slug(&item.title))],
                None => vec![],
            },
            KeyCode::Char('y') => match self.selector.current() {
                Some(item) if !item.image.is_empty() => {
                    vec![Action::CopyToClipboard(item.image.clone())]
                }
                _ => vec![],
            },
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        let hit = |r: &Rect| {
            r.width > 0
                && event.column >= r.x
                && event.column < r.x + r.width
                && event.row >= r.y
                && event.row < r.y + r.height
        };
        if hit(&self.prev_area) {
            return vec![Action::CarouselPrev];
        }
        if hit(&self.next_area) {
            return vec![Action::CarouselNext];
        }
        self.thumb_areas
            .iter()
            .find(|(r, _)| hit(r))
            .map(|(_, idx)| vec![Action::CarouselJump(*idx)])
            .unwrap_or_default()
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::CarouselNext => self.selector.next(),
            Action::CarouselPrev => self.selector.previous(),
            Action::CarouselJump(idx) => {
                if let Err(e) = self.selector.jump_to(*idx) {
                    warn!("carousel: {}", e);
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let position = self
            .selector
            .current_index()
            .map(|i| format!("{}/{}", i + 1, self.selector.len()));
        let badge = match &position {
            Some(p) => Some(Badge { text: p.as_str(), color: C_SECONDARY }),
            None if state.featured_error.is_none() => Some(Badge { text: "LOADING", color: C_LOADING }),
            None => None,
        };
        let block = pane_chrome("featured", None, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.prev_area = Rect::default();
        self.next_area = Rect::default();
        self.thumb_areas.clear();

        let Some(item) = self.selector.current().cloned() else {
            let text = match &state.featured_error {
                Some(_) => "  featured titles unavailable",
                None => "  loading featured titles…",
            };
            frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), inner);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(1),    // description
                Constraint::Length(1), // cover url
                Constraint::Length(1), // countdown
                Constraint::Length(1), // buttons + thumbnails
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(" "),
                Span::styled(item.title.clone(), style_title()),
            ])),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(item.description.clone(), style_secondary()))
                .wrap(Wrap { trim: true }),
            Rect { x: rows[1].x + 1, width: rows[1].width.saturating_sub(2), ..rows[1] },
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" cover ", style_muted()),
                Span::styled(item.image.clone(), Style::default().fg(C_LINK)),
            ])),
            rows[2],
        );

        if let Some(progress) = self.timer.progress() {
            let remaining = self.timer.period().as_secs_f64() * (1.0 - progress);
            let label = format!("next in {:.0}s", remaining.ceil());
            let bar = Rect { x: rows[3].x + 1, width: rows[3].width.saturating_sub(2), ..rows[3] };
            draw_progress(frame, bar, progress, Some(&label));
        }

        let nav = rows[4];
        if nav.width >= 12 {
            let btn = Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD);
            self.prev_area = Rect { x: nav.x + 1, width: 3, ..nav };
            self.next_area = Rect { x: nav.x + 5, width: 3, ..nav };
            frame.render_widget(Paragraph::new(Span::styled(" ◀ ", btn)), self.prev_area);
            frame.render_widget(Paragraph::new(Span::styled(" ▶ ", btn)), self.next_area);
            let thumbs = Rect { x: nav.x + 10, width: nav.width - 10, ..nav };
            self.draw_thumbnails(frame, thumbs);
        }
    }
}

/// Cut `s` to at most `width` display cells, marking the cut with `…`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use manga_proto::config::Config;
    use ratatui::crossterm::event::KeyModifiers;

    fn item(title: &str) -> FeaturedItem {
        FeaturedItem {
            title: title.to_string(),
            image: format!("http://img/{}.jpg", title),
            description: String::new(),
        }
    }

    fn view() -> CarouselView {
        let mut v = CarouselView::new(Duration::from_secs(10), 4);
        v.set_featured(vec![item("a"), item("b"), item("c")]);
        v
    }

    #[test]
    fn test_actions_move_cursor() {
        let state = AppState::new(Config::default());
        let mut v = view();
        v.on_action(&Action::CarouselPrev, &state);
        assert_eq!(v.current().map(|i| i.title.as_str()), Some("c"));
        v.on_action(&Action::CarouselNext, &state);
        v.on_action(&Action::CarouselNext, &state);
        assert_eq!(v.selector().current_index(), Some(1));
        v.on_action(&Action::CarouselJump(7), &state);
        assert_eq!(v.selector().current_index(), Some(1));
        v.on_action(&Action::CarouselJump(2), &state);
        assert_eq!(v.selector().current_index(), Some(2));
    }

    #[test]
    fn test_keys() {
        let state = AppState::new(Config::default());
        let mut v = view();
        let key = |c| KeyEvent::new(c, KeyModifiers::NONE);
        assert_eq!(v.handle_key(key(KeyCode::Right), &state), vec![Action::CarouselNext]);
        assert_eq!(v.handle_key(key(KeyCode::Char('h')), &state), vec![Action::CarouselPrev]);
        assert_eq!(
            v.handle_key(key(KeyCode::Enter), &state),
            vec![Action::OpenManga("a".into())]
        );

        let mut empty = CarouselView::new(Duration::from_secs(10), 4);
        assert!(empty.handle_key(key(KeyCode::Enter), &state).is_empty());
    }

    #[test]
    fn test_enter_opens_title_by_slug() {
        let state = AppState::new(Config::default());
        let mut v = CarouselView::new(Duration::from_secs(10), 4);
        v.set_featured(vec![item("Solo  Leveling"), item("Berserk")]);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            v.handle_key(enter, &state),
            vec![Action::OpenManga("solo-leveling".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_from_replaced_list_are_ignored() {
        let (tx, mut rx) = mpsc::channel::<CarouselTick>(8);
        let mut v = view();
        v.sync_timer(&tx, |t| t);
        let stale = CarouselTick { identity: v.selector().generation() };

        v.set_featured(vec![item("x"), item("y")]);
        v.sync_timer(&tx, |t| t);
        assert!(!v.on_tick(stale));
        assert_eq!(v.selector().current_index(), Some(0));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let tick = rx.recv().await.unwrap();
        assert!(v.on_tick(tick));
        assert_eq!(v.current().map(|i| i.title.as_str()), Some("y"));

        v.disarm();
        assert!(!v.on_tick(tick));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Berserk", 10), "Berserk");
        assert_eq!(truncate("Vagabond", 5), "Vaga…");
        assert_eq!(truncate("ワンピース", 5), "ワン…");
    }
}
