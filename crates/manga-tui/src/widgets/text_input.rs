//! TextInput — single-line tui-input field (chapter filter, wizard title).

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED};

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Changed(String),
    Confirmed,
    Cancelled,
}

pub struct TextInput {
    input: Input,
    active: bool,
    prefix: &'static str,
    placeholder: String,
}

impl TextInput {
    pub fn new(prefix: &'static str, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prefix,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Esc on a non-empty field clears it; Esc on an empty one deactivates.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc if !self.input.value().is_empty() => {
                self.clear();
                InputAction::Changed(String::new())
            }
            KeyCode::Esc => {
                self.deactivate();
                InputAction::Cancelled
            }
            KeyCode::Enter => InputAction::Confirmed,
            _ => {
                self.input.handle_event(&Event::Key(key));
                InputAction::Changed(self.input.value().to_string())
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prefix_w = self.prefix.chars().count();
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prefix_w as u16 + 2) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(
                format!("{}{}", self.prefix, self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(
                format!("{}{}", self.prefix, visible),
                Style::default().fg(C_INPUT_FG),
            )
        };

        frame.render_widget(
            Paragraph::new(Line::from(display)).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor = self.input.visual_cursor().saturating_sub(scroll) as u16;
            let cursor_x = area.x + prefix_w as u16 + cursor;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
