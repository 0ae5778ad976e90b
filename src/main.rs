mod app;
mod config;
mod constants;
mod dailymotion;
mod format;
mod input;
mod player;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use reqwest::Client;
use std::io::Write;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use dailymotion::{DailymotionClient, VideoSummary};
use format::format_duration;
use session::SearchSession;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Search Dailymotion from the terminal", long_about = None)]
struct Args {
  /// Initial search terms (default: a built-in query)
  #[arg(short, long)]
  query: Option<String>,

  /// Print results to stdout instead of starting the TUI
  #[arg(short, long)]
  print: bool,

  /// Number of pages to fetch in --print mode
  #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
  pages: u32,

  /// Emit --print results as JSON lines
  #[arg(long, requires = "print")]
  json: bool,

  /// Generate shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file in the data dir; stdout belongs to the TUI.
/// Filter with `MOTION_LOG` (default `info`).
fn init_file_logging() -> Option<WorkerGuard> {
  let dir = config::log_dir()?;
  std::fs::create_dir_all(&dir).ok()?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "motion.log"));
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("MOTION_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

fn init_stderr_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("MOTION_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "motion", &mut std::io::stdout());
    return Ok(());
  }

  let client = DailymotionClient::new(
    Client::builder()
      .user_agent(concat!("motion/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("Failed to build HTTP client")?,
  );

  if args.print {
    init_stderr_logging();
    return print_results(&client, &args).await;
  }

  let _log_guard = init_file_logging();
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, client, args).await;
  ratatui::restore();
  result
}

/// Headless mode: walk `--pages` pages of one search and print them.
async fn print_results(client: &DailymotionClient, args: &Args) -> Result<()> {
  let mut session = SearchSession::with_query(args.query.clone().unwrap_or_default());
  let mut stdout = std::io::stdout().lock();
  session.walk_pages(client, args.pages, |video| print_video(&mut stdout, video, args.json)).await?;
  Ok(())
}

fn print_video(out: &mut impl Write, video: &VideoSummary, json: bool) -> Result<()> {
  if json {
    writeln!(out, "{}", serde_json::to_string(video).context("Failed to serialize result")?)?;
  } else {
    writeln!(out, "{}  {}  {}", video.id, format_duration(video.duration_seconds), video.title)?;
  }
  Ok(())
}

async fn run(terminal: &mut DefaultTerminal, client: DailymotionClient, args: Args) -> Result<()> {
  let config = Config::load();
  let mut app = App::new(&config, client, args.query);
  app.trigger_search();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!(results = app.results().len(), "exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video() -> VideoSummary {
    VideoSummary { id: "x7abc".to_string(), title: "Veridis Quo".to_string(), description: String::new(), duration_seconds: 345 }
  }

  #[test]
  fn plain_line_has_id_duration_title() {
    let mut out = Vec::new();
    print_video(&mut out, &video(), false).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "x7abc  00:05:45  Veridis Quo\n");
  }

  #[test]
  fn json_line_round_trips() {
    let mut out = Vec::new();
    print_video(&mut out, &video(), true).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with('\n'));
    let parsed: VideoSummary = serde_json::from_str(text.trim_end()).unwrap();
    assert_eq!(parsed, video());
  }

  #[test]
  fn pages_must_be_positive() {
    assert!(Args::try_parse_from(["motion", "--print", "--pages", "0"]).is_err());
    assert!(Args::try_parse_from(["motion", "--json"]).is_err());
    let args = Args::try_parse_from(["motion", "--print", "--pages", "3", "-q", "daft"]).unwrap();
    assert_eq!((args.pages, args.query.as_deref()), (3, Some("daft")));
  }
}
