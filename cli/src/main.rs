//! mapscout CLI - binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI wires [`mapscout_config`] (settings), [`mapscout_providers`]
//! (Gemini search, location lookup), [`mapscout_engine`] (session state) and
//! [`mapscout_tui`] (rendering).
//!
//! ```text
//! main() -> Cli::parse() -> MapscoutConfig::load() -> App::new(GeminiSearch)
//!                |                                      |
//!                v                                      v
//!          QUERY given: run_once()          otherwise: TerminalSession + run_app()
//! ```
//!
//! # Event Loop
//!
//! The TUI renders on a fixed 16ms cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`mapscout_tui::InputPump`])
//! 3. Advance animation state (`app.tick()`)
//! 4. Apply finished searches (`app.process_completions()`)
//! 5. Render frame

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{self, Stdout, Write, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mapscout_config::{LocationMode, MapscoutConfig, config_dir};
use mapscout_engine::{
    App, AppOptions, Completion, Findings, GeoLocation, LocationSlot, SearchCollaborator,
    spawn_acquisition,
};
use mapscout_providers::{
    gemini::GeminiSearch,
    http_client,
    location::{IpLocation, NoLocation},
};
use mapscout_tui::{InputPump, SearchForm, draw, handle_events};
use mapscout_types::{ModelName, sanitize_single_line, sanitize_terminal_text};

#[derive(Debug, Parser)]
#[command(name = "mapscout", version)]
#[command(about = "Find local businesses with map-grounded Gemini search")]
struct Cli {
    /// Run a single search, print the results and exit.
    query: Option<String>,

    /// Area to search around, e.g. "Austin, TX".
    #[arg(long, value_name = "AREA")]
    near: Option<String>,

    /// Latitude to send with searches (requires --lon).
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to send with searches (requires --lat).
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Never send coordinates.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    no_location: bool,

    /// Gemini model to use.
    #[arg(long)]
    model: Option<String>,

    /// Write map_data_export.json after a one-shot search.
    #[arg(long, requires = "query")]
    export: bool,

    /// Write a CSV lead sheet named after the query after a one-shot search.
    #[arg(long, requires = "query")]
    export_csv: bool,

    /// Directory for map_data_export.json and CSV exports.
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Use ASCII glyphs only.
    #[arg(long)]
    ascii: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than writing over the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.mapscout/logs/mapscout.log
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("logs").join("mapscout.log"));
    }

    // Fallback: ./.mapscout/logs/mapscout.log
    candidates.push(PathBuf::from(".mapscout").join("logs").join("mapscout.log"));

    candidates
}

/// Where startup coordinates come from, in priority order:
/// CLI flags, `--no-location`, then the config file.
#[derive(Debug, Clone, PartialEq)]
enum LocationChoice {
    Fixed(GeoLocation),
    Ip { url: Option<String> },
    Off,
}

impl LocationChoice {
    fn resolve(cli: &Cli, config: &MapscoutConfig) -> Result<Self> {
        if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
            let location = GeoLocation::new(lat, lon).context("invalid --lat/--lon")?;
            return Ok(Self::Fixed(location));
        }
        if cli.no_location {
            return Ok(Self::Off);
        }

        let Some(section) = config.location.as_ref() else {
            return Ok(Self::Ip { url: None });
        };
        Ok(match section.mode {
            LocationMode::Fixed => match section.fixed_coordinates()? {
                Some(location) => Self::Fixed(location),
                None => Self::Off,
            },
            LocationMode::Off => Self::Off,
            LocationMode::Ip => Self::Ip {
                url: section.lookup_url.clone(),
            },
        })
    }

    /// Must be called from within a tokio runtime.
    fn spawn(self, slot: LocationSlot) {
        match self {
            Self::Fixed(location) => {
                // Known up front; publish before the first search can dispatch.
                slot.publish(location);
                tracing::info!(%location, "Using fixed location");
            }
            Self::Ip { url: Some(url) } => {
                spawn_acquisition(IpLocation::with_endpoint(url, http_client().clone()), slot);
            }
            Self::Ip { url: None } => {
                spawn_acquisition(IpLocation::new(), slot);
            }
            Self::Off => {
                spawn_acquisition(NoLocation, slot);
            }
        }
    }
}

fn load_config() -> MapscoutConfig {
    match MapscoutConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Warning: {e}. Continuing with defaults.");
            MapscoutConfig::default()
        }
    }
}

fn build_search(cli: &Cli, config: &MapscoutConfig) -> Result<GeminiSearch> {
    let Some(api_key) = config.api_key() else {
        let config_hint = MapscoutConfig::path()
            .map(|p| format!(" or add [api_keys] google = \"...\" to {}", p.display()))
            .unwrap_or_default();
        bail!(
            "No Gemini API key found. Set GEMINI_API_KEY (or API_KEY / GOOGLE_API_KEY){config_hint}."
        );
    };

    let model = match cli.model.as_deref().or(config.model()) {
        Some(raw) => ModelName::parse(raw).with_context(|| format!("invalid model {raw:?}"))?,
        None => ModelName::default(),
    };
    tracing::info!(model = %model, "Using Gemini model");

    Ok(GeminiSearch::new(api_key, model))
}

fn app_options(cli: &Cli, config: &MapscoutConfig) -> AppOptions {
    let area_hint = cli.near.clone().or_else(|| {
        config
            .location
            .as_ref()
            .and_then(|section| section.area.clone())
    });
    AppOptions {
        area_hint,
        export_dir: cli.export_dir.clone().or_else(|| config.export_dir()),
        ascii_only: cli.ascii || config.ascii_only(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config();
    let search = build_search(&cli, &config)?;
    let location = LocationChoice::resolve(&cli, &config)?;
    let mut app = App::new(search, app_options(&cli, &config));
    location.spawn(app.location_slot());

    if let Some(query) = cli.query.as_deref() {
        let exports = Exports {
            json: cli.export,
            csv: cli.export_csv,
        };
        return run_once(&mut app, query, exports).await;
    }

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };
    if let Err(err) = &result {
        tracing::error!("Exiting with error: {err:?}");
    }
    result
}

/// Artifacts to write after a one-shot search.
#[derive(Debug, Clone, Copy, Default)]
struct Exports {
    json: bool,
    csv: bool,
}

/// Print mode: one search, results on stdout, errors on stderr.
async fn run_once<C>(app: &mut App<C>, query: &str, exports: Exports) -> Result<()>
where
    C: SearchCollaborator + 'static,
{
    let Some(request) = app.submit_query(query) else {
        bail!("query is empty");
    };

    loop {
        let (id, completion) = app
            .next_completion()
            .await
            .ok_or_else(|| anyhow!("search task ended without a response"))?;
        if id != request {
            continue;
        }
        match completion {
            Completion::Succeeded => break,
            Completion::Failed => {
                let message = app.session().error().unwrap_or_default();
                bail!("{}", sanitize_single_line(message));
            }
            Completion::Stale => {}
        }
    }

    let mut out = io::stdout().lock();
    print_findings(&mut out, app.session().query(), app.session().findings())?;

    if exports.json {
        let path = app.export()?;
        writeln!(out, "\nExported to {}", path.display())?;
    }
    if exports.csv {
        let path = app.export_csv()?;
        writeln!(out, "\nExported CSV to {}", path.display())?;
    }
    Ok(())
}

fn print_findings(out: &mut impl Write, query: &str, findings: &Findings) -> io::Result<()> {
    writeln!(
        out,
        "Found {} places for \"{}\"",
        findings.places.len(),
        sanitize_single_line(query)
    )?;

    for (index, place) in findings.places.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}. {}", index + 1, sanitize_single_line(&place.title))?;
        writeln!(out, "   {}", sanitize_single_line(&place.uri))?;
        if let Some(summary) = place.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            writeln!(out, "   {}", sanitize_single_line(summary))?;
        }
        for review in place.reviews() {
            writeln!(out, "   \"{}\"", sanitize_single_line(review))?;
        }
    }

    let mut paragraphs = findings.paragraphs().peekable();
    if paragraphs.peek().is_some() {
        writeln!(out)?;
        writeln!(out, "Analysis")?;
        for paragraph in paragraphs {
            writeln!(out)?;
            writeln!(out, "{}", sanitize_terminal_text(paragraph))?;
        }
    }
    Ok(())
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableBracketedPaste) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

const FRAME_DURATION: Duration = Duration::from_millis(16);

async fn run_app<B, C>(terminal: &mut Terminal<B>, app: &mut App<C>) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
    C: SearchCollaborator + 'static,
{
    let mut input = InputPump::new();
    let mut form = SearchForm::new(app.area_hint());
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        let quit_now = match handle_events(app, &mut form, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.tick();
        app.process_completions();

        if let Err(e) = terminal.draw(|frame| draw(frame, app, &form)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
