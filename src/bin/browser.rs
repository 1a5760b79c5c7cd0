// src/bin/browser.rs

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ssot::app::App;
use ssot::client::ApiClient;
use ssot::config::BrowserConfig;
use ssot::ui::draw;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use std::{io, time::Duration};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tui::{Terminal, backend::CrosstermBackend};

const TICK_RATE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BrowserConfig::from_env();
    init_logging(&config.log_file)?;
    info!("Opus browser connecting to {}", config.api_url);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let client = ApiClient::new(config.api_url.clone(), config.api_token.clone());
    let mut app = App::new(client, config.repository_path.clone());
    app.reload();
    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error running app: {err:?}");
    }

    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ssot=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

async fn run_app<B: tui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Poll with a timeout so background results and timers are handled
        // even without input.
        let input = tokio::task::spawn_blocking(|| -> io::Result<Option<Event>> {
            if event::poll(TICK_RATE)? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await;
        if let Ok(Ok(Some(Event::Key(key)))) = input
            && key.kind == KeyEventKind::Press
        {
            app.handle_key_event(key);
        }

        while let Ok(event) = app.event_receiver.try_recv() {
            app.handle_event(event, Instant::now());
        }
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}
