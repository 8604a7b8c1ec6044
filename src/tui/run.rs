//! TUI entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::tui::app::App;

/// Initialise and run the terminal user interface until the user quits.
/// The terminal is restored even when the app loop fails.
pub async fn run_tui(config: AppConfig) -> io::Result<()> {
    info!(base_url = %config.base_url, user = config.user_id, "starting ui");
    let client = ApiClient::http(&config.base_url, config.cache_keep_unused);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, config);
    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!("ui closed");
    result
}
