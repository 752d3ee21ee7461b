//! Toast notifications — transient status messages, plus one spinner row
//! for long-running work (exports).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Self::Info => C_TOAST_INFO,
            Self::Success => C_TOAST_SUCCESS,
            Self::Warning => C_TOAST_WARNING,
            Self::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Info => "·",
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }

    fn lifetime(self) -> Duration {
        match self {
            Self::Info | Self::Success => Duration::from_secs(3),
            Self::Warning => Duration::from_secs(4),
            Self::Error => Duration::from_secs(6),
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const MAX_VISIBLE: usize = 4;

#[derive(Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
    /// Message and animation frame of the persistent spinner row.
    spinner: Option<(String, usize)>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        self.toasts.retain(|t| t.message != message);
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: Instant::now() + severity.lifetime(),
        });
        while self.toasts.len() > MAX_VISIBLE * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error);
    }

    /// Start or relabel the spinner row. It stays until `resolve_spinner`.
    pub fn spinner(&mut self, message: impl Into<String>) {
        let frame = self.spinner.as_ref().map_or(0, |(_, f)| *f);
        self.spinner = Some((message.into(), frame));
    }

    pub fn resolve_spinner(&mut self, severity: Severity, message: impl Into<String>) {
        self.spinner = None;
        self.push(message, severity);
    }

    pub fn has_spinner(&self) -> bool {
        self.spinner.is_some()
    }

    /// Drop expired toasts and advance the spinner. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some((_, frame)) = &mut self.spinner {
            *frame = (*frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    /// Render toasts in the top-right corner of `area`, spinner first.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30.min(area.width), 60);

        let spinner_row = self.spinner.as_ref().map(|(msg, f)| {
            (
                SPINNER_FRAMES[*f % SPINNER_FRAMES.len()],
                msg.as_str(),
                C_TOAST_INFO,
            )
        });
        let toast_rows = self
            .toasts
            .iter()
            .rev()
            .take(MAX_VISIBLE)
            .map(|t| (t.severity.icon(), t.message.as_str(), t.severity.color()));

        let bottom = area.y + area.height;
        for (row, (icon, message, color)) in spinner_row.into_iter().chain(toast_rows).enumerate() {
            let y = area.y + 1 + row as u16;
            if y >= bottom {
                break;
            }
            let w = (message.chars().count() as u16 + 5).min(max_width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", icon, message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
        }
    }
}
