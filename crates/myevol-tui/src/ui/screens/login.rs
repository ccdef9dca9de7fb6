use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::screens::welcome::LOGO;
use crate::ui::styles;

/// Visible width of the input fields
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let dialog = centered_rect_fixed(46, height, area);

    frame.render_widget(Clear, dialog);

    let mut lines = vec![];
    for row in LOGO {
        lines.push(Line::from(Span::styled(
            format!("            {}", row),
            styles::title_style(),
        )));
    }
    lines.push(Line::from(""));

    // Show the tail of long input so the cursor stays visible
    let email: String = tail(&app.login_email, FIELD_WIDTH);
    lines.push(field_line(
        "Email:    [",
        &email,
        app.login_focus == LoginFocus::Email,
    ));

    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(field_line(
        "Password: [",
        &masked,
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let style = styles::button_style(button_focused, app.can_submit_login());
    let label = if app.login_pending {
        "  Signing in…  "
    } else if button_focused {
        " ▶  Sign in  ◀ "
    } else {
        "    Sign in    "
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Sign in ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn field_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH),
            style,
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn tail(value: &str, width: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(width)).collect()
}
