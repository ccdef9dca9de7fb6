use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use myevol_core::screens::ProfileOutcome;

use crate::app::{App, Loadable};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = match &app.profile {
        Loadable::Idle | Loadable::Loading => vec![Line::from(Span::styled(
            " Loading profile…",
            styles::muted_style(),
        ))],
        Loadable::Ready(ProfileOutcome::Failed(message)) => vec![
            Line::from(Span::styled(format!(" {}", message), styles::error_style())),
            Line::from(""),
            Line::from(vec![
                Span::styled(" [r]", styles::help_key_style()),
                Span::styled(" Retry", styles::muted_style()),
            ]),
        ],
        Loadable::Ready(ProfileOutcome::Loaded(user)) => {
            let mut lines = vec![
                Line::from(Span::styled(format!(" {}", user.full_name()), styles::title_style())),
                Line::from(""),
                field(" Email", &user.email),
            ];
            if let Some(ref role) = user.role {
                lines.push(field(" Role", role));
            }
            lines
        }
    };

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [l]", styles::help_key_style()),
        Span::styled(" Sign out", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn field<'a>(label: &'a str, value: &str) -> Line<'a> {
    let value = if value.is_empty() { "-" } else { value };
    Line::from(vec![
        Span::styled(format!("{:<8}", label), styles::muted_style()),
        Span::styled(value.to_string(), styles::list_item_style()),
    ])
}
