//! MyEvol - a terminal client for the MyEvol backend.
//!
//! Sign in with email and password, keep the session across launches and
//! browse the home, profile and token test screens.

mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use myevol_core::storage::{FileStore, KeyringStore};
use myevol_core::{ApiClient, Config, SessionContext, Storage, TokenStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily file under the
/// data directory. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = Config::log_dir().ok()?;
    std::fs::create_dir_all(&log_dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("myevol")
        .filename_suffix("log")
        .build(&log_dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

/// Build the token store. The OS keychain is preferred where it persists;
/// otherwise the token goes to the file store. Whichever backend is not
/// chosen is registered as stale so a token from an earlier launch cannot
/// outlive a sign out.
async fn token_store(file_store: Arc<dyn Storage>) -> TokenStore {
    if !KeyringStore::is_persistent() {
        info!("No persistent keychain on this platform, storing the token on disk");
        return TokenStore::new(file_store);
    }

    let keyring = KeyringStore::default();
    match keyring.probe().await {
        Ok(true) => {
            info!("Storing the token in the OS keychain");
            TokenStore::new(Arc::new(keyring)).with_stale(file_store)
        }
        Ok(false) => {
            warn!("Keychain does not persist values, storing the token on disk");
            TokenStore::new(file_store).with_stale(Arc::new(keyring))
        }
        Err(e) => {
            // Unreachable keychain: nothing can be cleaned up there either
            warn!(error = %e, "Keychain unavailable, storing the token on disk");
            TokenStore::new(file_store)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    info!("MyEvol starting");

    // Fail before touching the terminal so the message stays readable
    let config = Config::from_env()?;
    let data_dir = Config::data_dir()?;

    let file_store: Arc<dyn Storage> = Arc::new(FileStore::new(&data_dir));
    let tokens = token_store(Arc::clone(&file_store)).await;
    let api = ApiClient::new(&config.api_url, tokens.clone())?;
    let session = Arc::new(SessionContext::new(api, tokens));
    info!(api_url = %config.api_url, "Configured backend");

    let mut app = App::new(config, session, file_store);
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("MyEvol shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Apply finished tasks and session changes before drawing
        app.tick();

        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let spawned tasks make progress between frames
        tokio::task::yield_now().await;
    }
}
