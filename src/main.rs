// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};

mod app;
mod command;
mod data;
mod events;
mod markup;
mod settings;
mod source;
mod ui;

use app::{App, View};
use command::{CheckDispatcher, HttpTransport};
use settings::Settings;
use source::{DataSource, FileSource, HttpSource};

#[derive(Parser, Debug)]
#[command(name = "nagwatch")]
#[command(about = "Terminal dashboard for Nagios status pages")]
struct Args {
    /// Base URL of the monitoring web interface (e.g. http://monitor/nagios)
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Path to a saved status HTML document
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Refresh interval in seconds (overrides configuration)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Path to a configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export parsed status to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let refresh = Duration::from_secs(args.refresh.unwrap_or(settings.refresh_secs));

    // The runtime backs the HTTP fetch loop and command dispatch; the TUI
    // loop itself stays synchronous.
    let runtime = tokio::runtime::Runtime::new()?;

    let (source, dispatcher): (Box<dyn DataSource>, Option<CheckDispatcher>) =
        if let Some(ref url) = args.url {
            let status_path = settings.status_path.clone();
            let source = runtime
                .block_on(async { HttpSource::spawn(url, &status_path, refresh) });
            let transport = Arc::new(HttpTransport::new(url, &settings.command_path));
            let dispatcher = CheckDispatcher::new(transport, runtime.handle().clone());
            (Box::new(source), Some(dispatcher))
        } else if let Some(ref path) = args.file {
            (Box::new(FileSource::new(path)), None)
        } else {
            bail!("either --url or --file is required");
        };

    if let Some(ref export_path) = args.export {
        return export_once(source, export_path);
    }

    run_tui(source, dispatcher)
}

/// Non-interactive mode: wait for one document, export it, exit.
fn export_once(source: Box<dyn DataSource>, path: &Path) -> Result<()> {
    let mut app = App::new(source, None);
    let deadline = Instant::now() + Duration::from_secs(30);
    while !app.reload_data() {
        if let Some(err) = app.load_error.clone() {
            bail!(err);
        }
        if Instant::now() >= deadline {
            bail!("no status document received within 30s");
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    app.export_state(path)?;
    println!("Exported status to: {}", path.display());
    Ok(())
}

/// Run the TUI with the given source and (optional) command dispatcher.
fn run_tui(source: Box<dyn DataSource>, dispatcher: Option<CheckDispatcher>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Create app and load initial data
    let mut app = App::new(source, dispatcher);
    app.reload_data();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 70;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Render header with page totals
            ui::common::render_header(frame, app, chunks[0]);

            // Render tabs
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::Services => ui::services::render(frame, app, chunks[2]),
                View::Updates => ui::updates::render(frame, app, chunks[2]),
                View::Stopped => ui::stopped::render(frame, app, chunks[2]),
            }

            // Render status bar
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Drain settled forced-check batches and pick up new documents.
        // The sources pace themselves; polling here is non-blocking.
        app.tick();
        app.reload_data();
    }

    Ok(())
}
