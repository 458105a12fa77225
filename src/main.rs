use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use logan_relay::{Relay, banner};

mod config;
mod demo;
mod view;

use config::Settings;

/// Logan - a live terminal dashboard for structured log events
#[derive(Parser, Debug)]
#[command(name = "logan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a relay's log stream (default)
    View(ViewArgs),

    /// Run the relay that emitters post to
    Serve(ServeArgs),

    /// Run a relay fed with sample events
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ViewArgs {
    /// Push-stream URL of the relay
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of entries kept in memory
    #[arg(long)]
    max_logs: Option<usize>,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics here; the terminal belongs to the UI
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// First port to try
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// First port to try
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::View(ViewArgs::default())) {
        Command::View(args) => run_view(args).await,
        Command::Serve(args) => run_serve(args).await,
        Command::Demo(args) => run_demo(args).await,
    };

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
}

/// Diagnostics for server modes go to stderr
fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The viewer owns the terminal, so diagnostics go to a file or nowhere
fn init_file_tracing(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_view(args: ViewArgs) -> Result<()> {
    if let Some(path) = &args.log_file {
        init_file_tracing(path)?;
    }

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        settings.url = url;
    }
    if let Some(max_logs) = args.max_logs {
        settings.max_logs = max_logs;
    }
    settings.validate()?;

    view::run(settings).await
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    init_stderr_tracing();

    let settings = Settings::load(args.config.as_deref())?;
    let port = args.port.unwrap_or(settings.relay.port);

    let relay = Relay::start(port, settings.relay.heartbeat())
        .await
        .context("Failed to start relay")?;
    println!("{}", banner(relay.addr()));

    tokio::select! {
        result = relay.wait() => result?,
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}

async fn run_demo(args: DemoArgs) -> Result<()> {
    init_stderr_tracing();

    let settings = Settings::default();
    let port = args.port.unwrap_or(settings.relay.port);
    demo::run(port, settings.relay.heartbeat()).await
}
