//! Bottom status bar: sort mode, marked totals, transient notes.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::model::app_state::{AppState, UiMode};

pub fn render(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let style = Style::default().add_modifier(Modifier::REVERSED);

    let mut left = format!(" Sort mode: {}", app.view.sort().label());
    if !app.marks.is_empty() {
        left.push_str(&format!(
            " | Marked: {} items ({})",
            app.marks.len(),
            app.format.format(app.marks.total_size())
        ));
    }
    if let Some(note) = &app.status_note {
        left.push_str(" | ");
        left.push_str(note);
    }
    if app.mode == UiMode::Refreshing {
        left.push_str(" | refreshing…");
    }

    let line = Line::from(Span::styled(
        format!("{left:<width$}", width = area.width as usize),
        style,
    ));
    frame.render_widget(Paragraph::new(line), area);
}
