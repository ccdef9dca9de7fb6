use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use myevol_core::tabs::{TabView, PROFILE_TAB, TABS, TEST_TAB};
use myevol_core::Route;

use crate::app::{App, AppState};

use super::screens::{login, profile, token_test, welcome};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let show_tabs = app.route() == Some(Route::Main);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                  // Title bar
            Constraint::Length(if show_tabs { 3 } else { 0 }),      // Tabs
            Constraint::Min(10),                                    // Main content
            Constraint::Length(2),                                  // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    if show_tabs {
        render_tabs(frame, app, chunks[1]);
    }
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(frame, "Are you sure you want to quit?", "quit"),
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Do you really want to sign out?", "sign out")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.route() {
        Some(route) => format!("  MyEvol · {}", route.title()),
        None => "  MyEvol".to_string(),
    };
    let help_hint = "[?] Help";
    let title_len = title.chars().count();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.tabs.active_key();

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in TABS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {} {}", i + 1, tab.icon, tab.name);
        if active == Some(tab.key) {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route() {
        None => render_splash(frame, area),
        Some(Route::Welcome) => welcome::render(frame, app, area, false),
        Some(Route::Login) => login::render(frame, app, area),
        Some(Route::Main) => match app.tabs.view() {
            TabView::Loading => render_splash(frame, area),
            TabView::Tab(tab) => match tab.key {
                PROFILE_TAB => profile::render(frame, app, area),
                TEST_TAB => token_test::render(frame, app, area),
                _ => welcome::render(frame, app, area, true),
            },
            TabView::Unknown(_) => render_unknown_tab(frame, area),
        },
    }
}

/// Shown while the stored session or tab is being read
fn render_splash(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Loading…", styles::muted_style())),
    ];
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_unknown_tab(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(" Unknown tab", styles::error_style())),
        Line::from(Span::styled(" Use 1-3 to pick a tab.", styles::muted_style())),
    ])
    .block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route() {
        Some(Route::Main) => "[l]ogout | [q]uit",
        Some(Route::Login) => "[Esc] back",
        _ => "[q]uit",
    };

    let (left_text, left_style) = match app.notice {
        Some(ref notice) => (
            format!(" {}: {} ", notice.title, notice.text),
            styles::notice_style(notice.kind),
        ),
        None => match app.session().age_display() {
            Some(age) => (format!(" Signed in {} ", age), styles::muted_style()),
            None => (" Signed out ".to_string(), styles::muted_style()),
        },
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(48, 29, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text: Vec<Line> = welcome::LOGO
        .iter()
        .map(|row| Line::from(Span::styled(format!("            {}", row), styles::title_style())))
        .collect();
    help_text.extend([
        Line::from(Span::styled(
            format!("               version {}", version),
            styles::muted_style(),
        )),
        Line::from(Span::styled(
            format!("  Server: {}", app.config.api_url),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Welcome", styles::highlight_style())),
        help_line("t", "Test the token"),
        help_line("l / Enter", "Sign in"),
        help_line("m / Enter", "Open the app (signed in)"),
        Line::from(""),
        Line::from(Span::styled(" Sign in", styles::highlight_style())),
        help_line("Tab / ↑↓", "Move between fields"),
        help_line("Enter", "Next field / submit"),
        help_line("Esc", "Back to welcome"),
        Line::from(""),
        Line::from(Span::styled(" App", styles::highlight_style())),
        help_line("1-3  ←/→", "Switch tabs"),
        help_line("r", "Reload the current tab"),
        help_line("l", "Sign out"),
        help_line("Esc", "Back to welcome"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use myevol_core::api::UserProfile;
    use myevol_core::screens::ProfileOutcome;
    use myevol_core::storage::{MemoryStore, ACTIVE_TAB_KEY};
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::app::tests::{settle, test_app};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let outer = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect_fixed(10, 4, outer), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect_fixed(40, 40, outer), Rect::new(0, 0, 20, 10));
    }

    #[tokio::test]
    async fn test_splash_before_session_resolves() {
        let app = test_app(Arc::new(MemoryStore::new()));
        assert!(screen_text(&app).contains("Loading"));
    }

    #[tokio::test]
    async fn test_welcome_for_guest() {
        let mut app = test_app(Arc::new(MemoryStore::new()));
        app.start();
        settle(&mut app, |a| a.route().is_some()).await;

        let text = screen_text(&app);
        assert!(text.contains("Not signed in"));
        assert!(text.contains("Sign in"));
    }

    #[tokio::test]
    async fn test_profile_tab_shows_user() {
        let mut app = test_app(Arc::new(MemoryStore::with_item(
            myevol_core::storage::TOKEN_KEY,
            "persisted",
        )));
        app.start();
        settle(&mut app, |a| a.tabs.is_loaded()).await;

        app.tabs.restore(Some(PROFILE_TAB.to_string()));
        app.profile = crate::app::Loadable::Ready(ProfileOutcome::Loaded(UserProfile {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            role: None,
        }));

        let text = screen_text(&app);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("ada@example.com"));
        assert!(text.contains("Sign out"));
    }

    #[tokio::test]
    async fn test_unknown_tab_fallback() {
        let storage = Arc::new(MemoryStore::with_item(
            myevol_core::storage::TOKEN_KEY,
            "persisted",
        ));
        myevol_core::Storage::set_item(storage.as_ref(), ACTIVE_TAB_KEY, "Journal")
            .await
            .unwrap();
        let mut app = test_app(storage);
        app.start();
        settle(&mut app, |a| a.tabs.is_loaded()).await;

        assert!(screen_text(&app).contains("Unknown tab"));
    }
}
