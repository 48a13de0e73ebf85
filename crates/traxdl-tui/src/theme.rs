//! Palette and text styles for the traxdl screens.

use ratatui::style::{Color, Modifier, Style};

pub const C_ACCENT: Color = Color::Rgb(125, 86, 244);
pub const C_HELP: Color = Color::Rgb(98, 98, 98);
pub const C_ERROR: Color = Color::Rgb(255, 0, 0);
pub const C_PROGRESS: Color = Color::Rgb(80, 200, 120);

pub fn style_title() -> Style {
    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn style_help() -> Style {
    Style::default().fg(C_HELP)
}

pub fn style_error() -> Style {
    Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD)
}

pub fn style_progress() -> Style {
    Style::default().fg(C_PROGRESS)
}
