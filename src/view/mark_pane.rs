//! Mark pane: two tabs, the marked-file list and the quick-view preview.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    model::{
        app_state::{AppState, FocusedPane},
        mark_set::MarkTab,
    },
    view::theme,
};

pub fn render(frame: &mut Frame<'_>, app: &mut AppState, area: Rect) {
    let focused = app.focus == FocusedPane::Mark;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Marked ")
        .border_style(if focused {
            Style::default().fg(theme::SELECTED_BG)
        } else {
            Style::default().fg(theme::DIM)
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 {
        return;
    }

    let sections = Layout::vertical([
        Constraint::Length(1), // tabs
        Constraint::Fill(1),   // content
        Constraint::Length(1), // footer
    ])
    .split(inner);

    render_tabs(frame, app, sections[0]);

    let content = sections[1];
    app.mark_viewport = content.height as usize;

    match app.marks.tab() {
        MarkTab::MarkedFiles => render_marked_files(frame, app, content),
        MarkTab::QuickView => render_quickview(frame, app, content),
    }

    let footer = Line::from(Span::styled(
        format!(
            " {} items ({})",
            app.marks.len(),
            app.format.format(app.marks.total_size())
        ),
        Style::default().add_modifier(Modifier::REVERSED),
    ));
    frame.render_widget(Paragraph::new(footer), sections[2]);
}

fn render_tabs(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let active = Style::default()
        .fg(theme::SELECTED_FG)
        .bg(theme::SELECTED_BG);
    let inactive = Style::default().fg(theme::DIM);
    let (qv, mf) = match app.marks.tab() {
        MarkTab::QuickView => (active, inactive),
        MarkTab::MarkedFiles => (inactive, active),
    };
    let line = Line::from(vec![
        Span::styled(" 1:QuickView ", qv),
        Span::raw(" "),
        Span::styled(" 2:Marked Files ", mf),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_marked_files(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let height = area.height as usize;
    let top = app.marks.top();
    let cursor = app.marks.cursor();
    let entries = app.marks.entries();
    let end = (top + height).min(entries.len());
    let focused = app.focus == FocusedPane::Mark;

    let mut lines: Vec<Line> = Vec::with_capacity(end.saturating_sub(top));
    for (index, entry) in entries.iter().enumerate().take(end).skip(top) {
        let selected = focused && index == cursor;
        let style = if selected {
            Style::default()
                .fg(theme::SELECTED_FG)
                .bg(theme::SELECTED_BG)
        } else {
            Style::default()
        };
        let size = app.format.format(entry.size());
        let path = entry.path().to_string_lossy();
        let width = area.width as usize;
        let text = format!("{size:>10}  {path}");
        let text = if text.chars().count() > width && width > 3 {
            let keep = width - 3;
            let tail: String = text
                .chars()
                .skip(text.chars().count() - keep)
                .collect();
            format!("...{tail}")
        } else {
            text
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_quickview(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let Some(preview) = app.marks.preview() else {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                " nothing to preview ",
                Style::default().fg(theme::DIM),
            ))),
            area,
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);

    // In-preview search line: the pattern being typed, or the last result.
    let search = app.marks.preview_search();
    if let Some(input) = search.input() {
        lines.push(Line::from(Span::styled(
            format!("search: {input}_"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    } else if let Some(status) = search.status() {
        lines.push(Line::from(Span::styled(
            status,
            Style::default().fg(theme::DIM),
        )));
    }

    let height = (area.height as usize).saturating_sub(lines.len());
    let offset = app.marks.preview_scroll().offset;
    let end = (offset + height).min(preview.lines.len());

    for text in &preview.lines[offset..end] {
        let width = area.width as usize;
        let clipped: String = text.chars().take(width).collect();
        lines.push(Line::raw(clipped));
    }
    if preview.truncated && end == preview.lines.len() {
        lines.push(Line::from(Span::styled(
            "… (truncated)",
            Style::default().fg(theme::DIM),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}
