use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use myevol_core::session::SessionOrigin;

use crate::app::App;
use crate::ui::styles;

pub const LOGO: [&str; 3] = [
    "╔╦╗╦ ╦╔═╗╦  ╦╔═╗╦  ",
    "║║║╚╦╝║╣ ╚╗╔╝║ ║║  ",
    "╩ ╩ ╩ ╚═╝ ╚╝ ╚═╝╩═╝",
];

/// Welcome screen. `in_tabs` is set when shown as the Home tab, where the
/// "open the app" action makes no sense.
pub fn render(frame: &mut Frame, app: &App, area: Rect, in_tabs: bool) {
    let mut lines = vec![Line::from("")];
    for row in LOGO {
        lines.push(Line::from(Span::styled(row, styles::title_style())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Track your progress, one step at a time.",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    let session = app.session();
    if session.is_authenticated() {
        let how = match session.origin() {
            Some(SessionOrigin::Restored) => "session restored",
            _ => "signed in",
        };
        let age = session.age_display().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("● ", styles::success_style()),
            Span::styled(format!("Connected ({}, {})", how, age), styles::list_item_style()),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::styled("○ ", styles::muted_style()),
            Span::styled("Not signed in", styles::list_item_style()),
        ]));
    }
    lines.push(Line::from(""));

    let mut actions = vec![("[t]", "Test the token")];
    if !app.is_authenticated() {
        actions.push(("[l]", "Sign in"));
    } else if !in_tabs {
        actions.push(("[m]", "Open the app"));
    }
    for (key, label) in actions {
        lines.push(Line::from(vec![
            Span::styled(key, styles::help_key_style()),
            Span::raw(" "),
            Span::styled(label, styles::help_desc_style()),
        ]));
    }

    let block = Block::default()
        .title(" Welcome ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(!in_tabs));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
