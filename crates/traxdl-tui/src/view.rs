//! Per-screen rendering. Pure: reads the model, draws widgets, never
//! mutates state or schedules work.

use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Gauge, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use traxdl_provider::format::{format_count, format_duration};

use crate::model::{Model, Screen, MENU_ITEMS};
use crate::theme;

pub fn draw(frame: &mut Frame, model: &Model) {
    let area = frame.area();
    if let Some(error) = &model.error {
        let lines = vec![
            Line::raw(""),
            Line::styled(format!("  Error: {}", error), theme::style_error()),
        ];
        frame.render_widget(Paragraph::new(lines), area);
        return;
    }
    match model.screen {
        Screen::Menu => draw_menu(frame, area, model),
        Screen::SearchInput => {
            draw_input(frame, area, "Search Music", "Enter search terms:", model, false)
        }
        Screen::UrlInput => {
            draw_input(frame, area, "Download from URL", "Enter YouTube URL:", model, true)
        }
        Screen::PlaylistInput => draw_input(
            frame,
            area,
            "Download Playlist",
            "Enter YouTube playlist URL:",
            model,
            true,
        ),
        Screen::Searching => draw_searching(frame, area, model),
        Screen::Results => draw_results(frame, area, model),
        Screen::Loading => draw_loading(frame, area, model),
        Screen::Details => draw_details(frame, area, model),
        Screen::Downloading => draw_downloading(frame, area, model),
        Screen::PlaylistDownloading => draw_playlist(frame, area, model),
    }
}

fn draw_menu(frame: &mut Frame, area: Rect, model: &Model) {
    let mut lines = vec![
        Line::styled(" Music Download ", theme::style_title()),
        Line::raw(""),
        Line::raw("  What would you like to do?"),
        Line::raw(""),
    ];
    for (i, item) in MENU_ITEMS.iter().enumerate() {
        if i == model.menu_cursor {
            lines.push(Line::styled(format!("> {}", item), theme::style_selected()));
        } else {
            lines.push(Line::raw(format!("  {}", item)));
        }
    }
    // A finished playlist run leaves its summary here.
    if let Some(message) = &model.message {
        lines.push(Line::raw(""));
        for part in message.lines() {
            lines.push(Line::raw(format!("  {}", part)));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "up/k up • down/j down • enter select • q quit",
        theme::style_help(),
    ));
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    prompt: &str,
    model: &Model,
    show_message: bool,
) {
    let mut lines = vec![
        Line::styled(format!(" {} ", title), theme::style_title()),
        Line::raw(""),
        Line::raw(format!("  {}", prompt)),
        Line::raw(""),
        Line::raw(format!("  > {}_", model.text_input)),
    ];
    if show_message {
        if let Some(message) = &model.message {
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!("  {}", message)));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "enter submit • esc back • ctrl+c quit",
        theme::style_help(),
    ));
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_searching(frame: &mut Frame, area: Rect, model: &Model) {
    let lines = vec![
        Line::raw(""),
        Line::raw(format!("  Searching YouTube for: {}", model.search_query)),
        Line::raw(""),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_loading(frame: &mut Frame, area: Rect, model: &Model) {
    let text = match &model.message {
        Some(message) => format!("  {}", message),
        None => "  Loading video details...".to_string(),
    };
    let lines = vec![Line::raw(""), Line::raw(text), Line::raw("")];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_results(frame: &mut Frame, area: Rect, model: &Model) {
    let mut lines = vec![
        Line::styled(" Search Results ", theme::style_title()),
        Line::raw(""),
    ];
    let total = model.results.len();
    // Rows left for result entries once title, sentinel and help rows are
    // accounted for; the window keeps the cursor in view.
    let visible = (model.height as usize).saturating_sub(6).max(1);
    let first = if total > visible {
        let anchor = model.cursor.min(total.saturating_sub(1));
        let mut start = anchor.saturating_sub(visible / 2);
        if start + visible > total {
            start = total - visible;
        }
        start
    } else {
        0
    };
    let last = (first + visible).min(total);
    for (i, hit) in model.results.iter().enumerate().take(last).skip(first) {
        let title = truncate_title(&hit.title, area.width);
        if i == model.cursor {
            lines.push(Line::styled(format!("> {}", title), theme::style_selected()));
        } else {
            lines.push(Line::raw(format!("  {}", title)));
        }
    }
    lines.push(Line::raw(""));
    if model.cursor == total {
        lines.push(Line::styled(
            "> Load more results...",
            theme::style_selected(),
        ));
    } else {
        lines.push(Line::raw("  Load more results..."));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "up/k up • down/j down • enter select • esc back • q quit",
        theme::style_help(),
    ));
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_details(frame: &mut Frame, area: Rect, model: &Model) {
    let Some(selected) = &model.selected else {
        frame.render_widget(Paragraph::new("  Loading video details..."), area);
        return;
    };
    let mut lines = vec![
        Line::styled(" Video Details ", theme::style_title()),
        Line::raw(""),
        Line::raw(format!("  Title:    {}", selected.title)),
    ];
    // Placeholders until the full metadata fetch lands.
    if selected.channel.is_empty() {
        lines.push(Line::raw("  Channel:  Loading..."));
    } else {
        lines.push(Line::raw(format!("  Channel:  {}", selected.channel)));
    }
    if selected.duration > 0 {
        lines.push(Line::raw(format!(
            "  Duration: {}",
            format_duration(selected.duration)
        )));
    } else {
        lines.push(Line::raw("  Duration: Loading..."));
    }
    if selected.view_count > 0 {
        lines.push(Line::raw(format!(
            "  Views:    {}",
            format_count(selected.view_count)
        )));
    } else {
        lines.push(Line::raw("  Views:    Loading..."));
    }
    if let Some(message) = &model.message {
        lines.push(Line::raw(""));
        lines.push(Line::raw(format!("  {}", message)));
    }
    lines.push(Line::raw(""));
    let help = if model.preview.active() {
        "s stop preview • d download • esc back • q quit"
    } else {
        "p preview • d download • esc back • q quit"
    };
    lines.push(Line::styled(help, theme::style_help()));
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_downloading(frame: &mut Frame, area: Rect, model: &Model) {
    let title = model
        .selected
        .as_ref()
        .map(|s| s.title.as_str())
        .unwrap_or("");
    let lines = vec![
        Line::styled(" Downloading ", theme::style_title()),
        Line::raw(""),
        Line::raw(format!("  Title:   {}", title)),
        Line::raw("  Status:  Downloading and converting to MP3..."),
        Line::raw("  Quality: High-quality audio with cover art"),
        Line::raw(""),
        Line::raw("  Please wait, this may take a moment..."),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_playlist(frame: &mut Frame, area: Rect, model: &Model) {
    let Some(run) = &model.playlist else {
        frame.render_widget(Paragraph::new("  Preparing playlist..."), area);
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let header = vec![
        Line::styled(" Downloading Playlist ", theme::style_title()),
        Line::raw(""),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let total = run.total();
    let ratio = if total == 0 {
        0.0
    } else {
        run.cursor as f64 / total as f64
    };
    let gauge = Gauge::default()
        .gauge_style(theme::style_progress())
        .ratio(ratio)
        .label(format!("{}/{}", run.cursor, total));
    frame.render_widget(gauge, chunks[1].inner(Margin::new(2, 0)));

    let mut lines = vec![
        Line::raw(""),
        Line::raw(format!("  Success: {}   Failed: {}", run.ok, run.failed)),
    ];
    if let Some(message) = &model.message {
        lines.push(Line::raw(""));
        lines.push(Line::raw(format!("  {}", message)));
    }
    frame.render_widget(Paragraph::new(lines), chunks[2]);
}

/// Truncate to the pane width by display columns, with an ellipsis.
fn truncate_title(title: &str, width: u16) -> String {
    let max = (width as usize).saturating_sub(4).max(8);
    if title.width() <= max {
        return title.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in title.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
