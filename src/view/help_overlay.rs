//! Help overlay listing every key binding; any key closes it.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::view::theme;

const HELP_TEXT: &[&str] = &[
    "",
    "  Navigation",
    "    ↑/k  ↓/j         move up / down",
    "    PgUp/PgDn        move a page",
    "    Ctrl-u / Ctrl-d  move half a page",
    "    Home / End       jump to first / last",
    "    →/l/Enter        enter directory",
    "    ←/h/u/Backspace  back to parent",
    "    O                open with the system viewer",
    "",
    "  Marking",
    "    space            toggle mark",
    "    d                mark & move down (delete when marks exist)",
    "    a                toggle all in this directory",
    "",
    "  Sorting",
    "    s / n / m / c    by size / name / mtime / count",
    "",
    "  Display",
    "    M / C            toggle mtime / count columns",
    "    /                glob search",
    "    r / R            refresh selected / refresh all",
    "    Tab              switch pane focus",
    "    1 / 2            mark pane tabs",
    "",
    "  Quick view (mark pane, tab 1)",
    "    j/k  g/G         scroll / top / bottom",
    "    /  n  N          search / next / previous match",
    "",
    "    q                quit (marked paths go to stdout)",
    "",
    "  Press any key to close help",
    "",
];

pub fn render(frame: &mut Frame<'_>, area: Rect) {
    let width = 58.min(area.width);
    let height = (HELP_TEXT.len() as u16 + 2).min(area.height);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(popup);

    let lines: Vec<Line> = HELP_TEXT.iter().map(|s| Line::raw(*s)).collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(theme::HELP_BORDER));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
