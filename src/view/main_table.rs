//! Main pane: the current directory as a table of
//! `[mark] [size] [percent] [bar] [mtime?] [count?] [name]`.
//!
//! Only the visible window of rows is materialised; a directory with a
//! million children renders in time proportional to the viewport.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    model::app_state::{AppState, FocusedPane},
    view::theme,
};

const BAR_WIDTH: usize = 12;

pub fn render(frame: &mut Frame<'_>, app: &mut AppState, area: Rect) {
    let focused = app.focus == FocusedPane::Main;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title(app))
        .border_style(if focused {
            Style::default().fg(theme::SELECTED_BG)
        } else {
            Style::default().fg(theme::DIM)
        });

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    app.main_viewport = height;
    if height == 0 || inner.width == 0 {
        return;
    }

    let top = app.view.top();
    let cursor = app.view.cursor();
    let end = (top + height).min(app.view.len());
    let format = app.format;
    let show_mtime = app.show_mtime;
    let show_count = app.show_count;

    let mut lines: Vec<Line> = Vec::with_capacity(end.saturating_sub(top));
    for index in top..end {
        // Immutable facts first, then the cached strings (mutable borrow).
        let (is_dir, is_symlink, is_marked, entry_count) = {
            let entry = &app.view.entries()[index];
            (
                entry.is_dir(),
                entry.is_symlink(),
                entry.is_marked(),
                entry.entry_count(),
            )
        };
        let Some(row) = app.view.row(index, format) else {
            continue;
        };

        let selected = focused && index == cursor;
        let base = if selected {
            Style::default()
                .fg(theme::SELECTED_FG)
                .bg(theme::SELECTED_BG)
        } else {
            Style::default()
        };

        let mut spans: Vec<Span> = Vec::with_capacity(10);

        spans.push(if is_marked {
            Span::styled(
                "*",
                base.fg(theme::MARKED).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(" ", base)
        });

        spans.push(Span::styled(
            format!("{:>10}", row.size),
            if selected { base } else { base.fg(theme::SIZE) },
        ));
        spans.push(Span::styled(" | ", base));

        spans.push(Span::styled(
            format!("{:>5.1}%", row.percent),
            if selected { base } else { base.fg(theme::PERCENT) },
        ));
        spans.push(Span::styled(" | ", base));

        let filled = ((row.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        spans.push(Span::styled(
            "█".repeat(filled),
            if selected { base } else { base.fg(theme::BAR) },
        ));
        spans.push(Span::styled(" ".repeat(BAR_WIDTH - filled), base));
        spans.push(Span::styled(" | ", base));

        if show_mtime {
            spans.push(Span::styled(format!("{:>19} | ", row.mtime), base));
        }
        if show_count {
            let count = if entry_count > 0 {
                format!("{entry_count:>7}")
            } else {
                format!("{:>7}", "-")
            };
            spans.push(Span::styled(format!("{count} | "), base));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let name_width = (inner.width as usize).saturating_sub(used + 1);
        let name = truncate_left(&row.name, name_width);
        let name_style = if selected {
            base.add_modifier(Modifier::BOLD)
        } else if is_dir {
            base.fg(theme::DIRECTORY).add_modifier(Modifier::BOLD)
        } else if is_symlink {
            base.fg(theme::SYMLINK)
        } else {
            base
        };
        spans.push(Span::styled(
            format!("{}{name}", if is_dir { "/" } else { " " }),
            name_style,
        ));

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn title(app: &AppState) -> String {
    let current = app.current_dir();
    let path = current.path().to_string_lossy();
    let shown = if path.is_empty() { "[root]" } else { &path };
    format!(
        " {} ({} visible, {} total, {}) ",
        shown,
        app.view.len(),
        current.entry_count(),
        app.format.format(current.size()),
    )
}

/// Truncate from the left with an ellipsis so the basename's tail, the
/// interesting part, stays visible.
fn truncate_left(name: &str, width: usize) -> String {
    let len = name.chars().count();
    if len <= width {
        return name.to_string();
    }
    if width <= 3 {
        return ".".repeat(width);
    }
    let keep = width - 3;
    let tail: String = name
        .chars()
        .skip(len - keep)
        .collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::truncate_left;

    #[test]
    fn short_names_unchanged() {
        assert_eq!(truncate_left("abc", 10), "abc");
    }

    #[test]
    fn long_names_keep_the_tail() {
        assert_eq!(truncate_left("abcdefghij", 7), "...ghij");
    }

    #[test]
    fn tiny_widths_degenerate_gracefully() {
        assert_eq!(truncate_left("abcdef", 2), "..");
    }
}
