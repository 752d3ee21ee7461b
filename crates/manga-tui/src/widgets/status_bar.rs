//! Status bar — screen tabs on top, mode + keybindings at the bottom.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::Screen;
use crate::theme::{C_MODE_EDIT, C_MODE_NORMAL, C_MUTED, C_NUMBER_HINT, C_PRIMARY, C_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// A text field has the keyboard; global keys are suspended.
    Editing,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Editing => "EDIT",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Editing => C_MODE_EDIT,
        }
    }
}

/// One row of `[1] browse  [2] detail ...` with the current screen highlighted.
pub fn draw_tabs(frame: &mut Frame, area: Rect, current: Screen) {
    let mut spans = vec![Span::styled(
        " anymanga ",
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
    )];
    for screen in Screen::ALL {
        spans.push(Span::styled("│", Style::default().fg(C_SEPARATOR)));
        spans.push(Span::styled(
            format!(" [{}] ", screen.hotkey()),
            Style::default().fg(C_NUMBER_HINT),
        ));
        let style = if screen == current {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_MUTED)
        };
        spans.push(Span::styled(format!("{} ", screen.label()), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn keys_for(screen: Screen, mode: InputMode) -> &'static str {
    match mode {
        InputMode::Editing => " type  Enter confirm  Esc clear/cancel",
        InputMode::Normal => match screen {
            Screen::Browse => {
                " ←→/hl carousel  Enter see more  Tab pane  click thumbnail  1-3/d screens  ? help  q quit"
            }
            Screen::Detail => {
                " ↑↓/jk select  Enter read  / filter  d download  y copy cover  Esc back  ? help  q quit"
            }
            Screen::Reader => " ↑↓/jk select  y/Enter copy page url  Esc back  ? help  q quit",
            Screen::Download => {
                " Enter next  ←/Backspace previous step  ↑↓/jk pick  Esc back  ? help  q quit"
            }
        },
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, screen: Screen, mode: InputMode) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(screen, mode), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
