//! Smooth Unicode progress bar (carousel countdown, export progress).

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PROGRESS};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render `progress` (0.0..=1.0) across `area`, with an optional trailing label.
pub fn draw_progress(frame: &mut Frame, area: Rect, progress: f64, label: Option<&str>) {
    if area.width < 4 || area.height == 0 {
        return;
    }
    let label = label.map(|l| format!(" {}", l)).unwrap_or_default();
    let bar_w = area.width.saturating_sub(label.chars().count() as u16).max(4) as usize;

    let spans = vec![
        Span::styled(render_bar(progress, bar_w), Style::default().fg(C_PROGRESS)),
        Span::styled(label, Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Bar text exactly `width` cells wide, 8 sub-steps per cell.
fn render_bar(progress: f64, width: usize) -> String {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full.min(width) {
        bar.push('█');
    }
    if full < width {
        bar.push(BLOCKS[partial]);
        for _ in (full + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_is_stable() {
        for p in [0.0, 0.13, 0.5, 0.999, 1.0, 7.0] {
            assert_eq!(render_bar(p, 10).chars().count(), 10, "p={}", p);
        }
        assert_eq!(render_bar(1.0, 4), "████");
        assert_eq!(render_bar(0.5, 4), "██  ");
    }
}
