//! Colour palette for the TUI, kept to the terminal's base colours so the
//! user's scheme shows through.

use ratatui::style::Color;

pub const DIRECTORY: Color = Color::Cyan;
pub const SYMLINK: Color = Color::Magenta;
pub const SIZE: Color = Color::Green;
pub const PERCENT: Color = Color::Yellow;
pub const BAR: Color = Color::Green;
pub const MARKED: Color = Color::Red;
pub const SELECTED_FG: Color = Color::Black;
pub const SELECTED_BG: Color = Color::Cyan;
pub const HELP_BORDER: Color = Color::Blue;
pub const DIM: Color = Color::DarkGray;
