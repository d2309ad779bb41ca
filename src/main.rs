// algoviz: sandboxed sorting-algorithm visualizer with step playback

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use algoviz::algorithms::default_program;
use algoviz::config::{self, Config};
use algoviz::dataset::Dataset;
use algoviz::executor::{ExecutionOutcome, Executor, RunStatus, EMPTY_RESULT_MESSAGE};
use algoviz::memory::value::format_number;
use algoviz::ui::App;

const LOG_FILE: &str = "algoviz.log";

/// Write a sort function, watch it run step by step
#[derive(Parser)]
#[command(name = "algoviz", version)]
#[command(about = "Sandboxed sorting-algorithm visualizer with step-by-step playback")]
struct Cli {
    /// Script defining `function sort(data, snapshot)`; the built-in
    /// insertion sort when omitted
    file: Option<PathBuf>,

    /// Comma-separated dataset, e.g. `5,3,1`
    #[arg(long)]
    data: Option<String>,

    /// Playback interval in milliseconds
    #[arg(long)]
    speed: Option<u64>,

    /// Config file (default: config.toml in the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run once without the UI and print every recorded step
    #[arg(long)]
    trace: bool,

    /// With --trace, print the outcome as JSON
    #[arg(long, requires = "trace")]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.trace)?;

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(speed) = cli.speed {
        config.playback.default_speed_ms = speed;
    }

    let source = match &cli.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => default_program().to_string(),
    };

    let dataset = match &cli.data {
        Some(text) => Dataset::parse(text).with_context(|| format!("Invalid --data '{text}'"))?,
        None => config.dataset.initial_dataset(),
    };

    if cli.trace {
        let outcome = Executor::new(config.execution.clone()).execute(&source, dataset.values());
        print_trace(&outcome, cli.json)?;
        if !outcome.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    run_tui(&config, &source, dataset)
}

/// Logs go to stderr in trace mode and to a file otherwise, since the TUI
/// owns the terminal.
fn init_logging(trace: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if trace {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    let path = log_path();
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn log_path() -> PathBuf {
    config::data_dir()
        .filter(|dir| fs::create_dir_all(dir).is_ok())
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(LOG_FILE)
}

fn print_trace(outcome: &ExecutionOutcome, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut stdout, outcome)?;
        writeln!(stdout)?;
        return Ok(());
    }

    for line in &outcome.logs {
        writeln!(stdout, "> {line}")?;
    }
    for (index, step) in outcome.steps.iter().enumerate() {
        let array: Vec<String> = step.array.iter().map(|&v| format_number(v)).collect();
        let highlights: Vec<String> = step.highlights.iter().map(usize::to_string).collect();
        writeln!(
            stdout,
            "#{} [{}] {{{}}} {}",
            index + 1,
            array.join(", "),
            highlights.join(", "),
            step.description
        )?;
    }
    match outcome.status() {
        RunStatus::Ready(count) => writeln!(stdout, "{count} steps recorded")?,
        RunStatus::Empty => writeln!(stdout, "{EMPTY_RESULT_MESSAGE}")?,
        RunStatus::Failed(err) => match err.location() {
            Some(location) => writeln!(io::stderr(), "Error: {err} (line {})", location.line)?,
            None => writeln!(io::stderr(), "Error: {err}")?,
        },
    }
    Ok(())
}

fn run_tui(config: &Config, source: &str, dataset: Dataset) -> Result<()> {
    info!(
        speed_ms = config.playback.default_speed_ms,
        values = dataset.len(),
        "starting terminal UI"
    );

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(config, source, dataset);
    let res = app.run(&mut terminal);
    drop(app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("Terminal UI failed")
}
