use std::fs::{self, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{debug, error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::MissedTickBehavior;
use vpw_core::{EmbedApis, PlayerController, VideoRecord, WidgetConfig, publish_catalog};

mod app;
mod host;
mod ui;

use app::App;
use host::{HostOptions, SimulatedHost};

/// ~30 FPS redraw; also the simulated clock's resolution
const TICK_RATE: Duration = Duration::from_millis(33);

/// Terminal preview of the video widget
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON array of video records, as stored by the admin page
    catalog: PathBuf,

    /// Widget config file (defaults to <config_dir>/vpw/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Length of every simulated video in seconds
    #[arg(long, default_value_t = 30)]
    duration: u64,

    /// Reject playback that was not started by a key press or click
    #[arg(long)]
    block_autoplay: bool,

    /// Delay before an injected embed API reports ready, in milliseconds
    #[arg(long, default_value_t = 800)]
    api_delay_ms: u64,

    /// Where log output goes while the terminal UI is up
    #[arg(long, default_value = "vpw-player.log")]
    log_file: PathBuf,
}

fn init_logger(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WidgetConfig> {
    if let Some(path) = path {
        return WidgetConfig::load(path);
    }

    match dirs::config_dir().map(|dir| dir.join("vpw").join("config.json")) {
        Some(path) if path.exists() => WidgetConfig::load(&path),
        _ => {
            debug!("No config file, using defaults");
            Ok(WidgetConfig::default())
        }
    }
}

/// Publish the stored records and render them into the widget's data attribute
fn load_data_attribute(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    let records: Vec<VideoRecord> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse catalog: {}", path.display()))?;

    let catalog = publish_catalog(records).context("Catalog has no enabled videos")?;
    info!("Published {} videos", catalog.len());
    Ok(catalog.to_data_attribute()?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK_RATE);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal.draw(|f| {
            if let Err(e) = ui::draw_ui(f, app) {
                error!("UI draw function error: {}", e);
            }
        })?;

        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                app.tick(now - last_tick);
                last_tick = now;
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    debug!("Key {:?} with modifiers {:?}", key.code, key.modifiers);
                    app.handle_key_event(key);
                }
                Some(Ok(Event::Mouse(mouse))) => app.handle_mouse_event(mouse),
                Some(Ok(_)) => {}
                Some(Err(e)) => warn!("Error reading event: {}", e),
                None => break,
            },
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_file)?;
    info!("Application starting");

    let config = load_config(args.config.as_deref())?;
    let data_attribute = load_data_attribute(&args.catalog)?;

    let apis = EmbedApis::global();
    let options = HostOptions {
        video_duration: Duration::from_secs(args.duration.max(1)),
        block_autoplay: args.block_autoplay,
        api_delay: Duration::from_millis(args.api_delay_ms),
    };
    let host = SimulatedHost::new(options, apis.clone());
    let controller = PlayerController::mount(host, config, Some(&data_attribute), apis)
        .context("Widget did not mount")?;
    let mut app = App::new(controller);

    // Set up clean terminal restoration on panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        error!("PANIC: {}", panic_info);
        orig_hook(panic_info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to setup terminal");
    }

    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to create terminal");
        }
    };
    debug!("Terminal setup complete");

    let result = run(&mut terminal, &mut app).await;

    info!("Shutting down application");
    app.shutdown();

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Error during cleanup: {}", e);
        eprintln!("Error during cleanup: {}", e);
    }

    result
}
