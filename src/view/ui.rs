//! Frame orchestrator: lays out the panes and draws overlays on top.
//!
//! Called only when a dirty flag is set; the terminal's cell diff confines
//! a cursor-level repaint to the rows that changed.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    model::app_state::{AppState, UiMode},
    view::{help_overlay, main_table, mark_pane, status_bar, theme},
};

pub fn render(frame: &mut Frame<'_>, app: &mut AppState) {
    let area = frame.area();
    let rows = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Fill(1),   // panes
        Constraint::Length(1), // status bar
        Constraint::Length(1), // hint / input line
    ])
    .split(area);

    render_header(frame, rows[0]);

    if app.mark_pane_visible() {
        let panes =
            Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).split(rows[1]);
        main_table::render(frame, app, panes[0]);
        mark_pane::render(frame, app, panes[1]);
    } else {
        main_table::render(frame, app, rows[1]);
    }

    status_bar::render(frame, app, rows[2]);
    render_hint_line(frame, app, rows[3]);

    match app.mode {
        UiMode::Help => help_overlay::render(frame, area),
        UiMode::ConfirmDelete => render_confirm_dialog(frame, app, area),
        _ => {}
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect) {
    let line = Line::from(Span::styled(
        format!(
            " duscan v{}    (press ? for help)",
            env!("CARGO_PKG_VERSION")
        ),
        Style::default().add_modifier(Modifier::REVERSED),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_hint_line(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let text = match app.mode {
        UiMode::GlobInput => format!(" Search: {}_", app.glob_input),
        UiMode::Refreshing => " refreshing…".to_string(),
        _ => " mark = space/d | delete = d | search = / | refresh = r/R".to_string(),
    };
    frame.render_widget(Paragraph::new(Line::raw(text)), area);
}

fn render_confirm_dialog(frame: &mut Frame<'_>, app: &AppState, area: Rect) {
    let width = 52.min(area.width);
    let height = 7.min(area.height);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(popup);

    let lines = vec![
        Line::raw(format!(
            "Delete {} marked items ({})?",
            app.marks.len(),
            app.format.format(app.marks.total_size())
        )),
        Line::raw("This action cannot be undone!"),
        Line::raw(""),
        Line::raw("Type YES and press Enter to confirm:"),
        Line::from(Span::styled(
            format!("> {}_", app.confirm_input),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm deletion ")
        .border_style(Style::default().fg(theme::MARKED));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
