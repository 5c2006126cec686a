//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads `.env`
//! - validates the feed configuration
//! - picks the market source (live CNBC or a JSON fixture)
//! - dispatches to the TUI, one-shot report, or headless watcher

use std::path::Path;

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FeedArgs, OnceArgs, TuiArgs, WatchArgs};
use crate::data::{CnbcClient, DataAdapter, FixtureSource, MarketSource};
use crate::domain::FeedConfig;
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::scheduler::RefreshScheduler;

pub mod pipeline;

const TUI_LOG_FILE: &str = "pulse.log";

/// Entry point for the `pulse` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `pulse` and `pulse --fixture x.json` to behave like `pulse tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Once(args) => handle_once(args),
        Command::Watch(args) => handle_watch(args),
    }
}

/// Boxed source selected by configuration.
pub type DynSource = Box<dyn MarketSource>;

/// Validate `config` and build the source it names.
pub fn build_source(config: &FeedConfig) -> Result<DynSource, AppError> {
    config.validate()?;
    match &config.fixture {
        Some(path) => {
            info!(path = %path.display(), "using fixture source");
            Ok(Box::new(FixtureSource::from_path(path)?))
        }
        None => {
            info!(url = %config.quote_url, "using CNBC source");
            Ok(Box::new(CnbcClient::new(config)?))
        }
    }
}

fn init_logging(feed: &FeedArgs, default_file: Option<&str>) -> Result<(), AppError> {
    match (&feed.log_file, default_file) {
        (Some(path), _) => logging::init(LogTarget::File(path)),
        (None, Some(path)) => logging::init(LogTarget::File(Path::new(path))),
        (None, None) => logging::init(LogTarget::Stderr),
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    init_logging(&args.feed, Some(TUI_LOG_FILE))?;
    let config = args.feed.feed_config();
    let source = build_source(&config)?;
    let handle = RefreshScheduler::new(source, &config)?.spawn()?;
    crate::tui::run(&handle)
}

fn handle_once(args: OnceArgs) -> Result<(), AppError> {
    init_logging(&args.feed, None)?;
    let config = args.feed.feed_config();
    let adapter = DataAdapter::new(build_source(&config)?);
    let snapshot = pipeline::run_cycle(&adapter, 1);

    if args.json {
        println!("{}", crate::io::snapshot_json(&snapshot)?);
    } else {
        println!("{}", crate::report::format_snapshot(&snapshot));
        println!(
            "{}",
            crate::plot::render_yield_curve(&snapshot.yield_curve, args.width, args.height)
        );
    }

    if let Some(path) = &args.export {
        crate::io::write_snapshot_json(path, &snapshot)?;
        info!(path = %path.display(), "snapshot exported");
    }
    Ok(())
}

fn handle_watch(args: WatchArgs) -> Result<(), AppError> {
    init_logging(&args.feed, None)?;
    let config = args.feed.feed_config();
    let source = build_source(&config)?;
    let scheduler = RefreshScheduler::new(source, &config)?;
    let updates = scheduler.store().subscribe();
    let handle = scheduler.spawn()?;

    let mut seen = 0u64;
    for snapshot in updates.iter() {
        println!("{}", crate::report::format_summary_line(&snapshot));
        seen += 1;
        if args.cycles.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    handle.shutdown();
    Ok(())
}

/// Rewrite argv so `pulse` defaults to `pulse tui`.
///
/// Rules:
/// - `pulse`                      -> `pulse tui`
/// - `pulse --fixture q.json ...` -> `pulse tui --fixture q.json ...`
/// - `pulse --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "once" | "watch");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["pulse"])), argv(&["pulse", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["pulse", "--fixture", "q.json"])),
            argv(&["pulse", "tui", "--fixture", "q.json"])
        );
        for unchanged in [argv(&["pulse", "--help"]), argv(&["pulse", "once"])] {
            assert_eq!(rewrite_args(unchanged.clone()), unchanged);
        }
    }

    #[test]
    fn invalid_interval_is_fatal_before_fetching() {
        let config = FeedConfig {
            refresh_interval: std::time::Duration::ZERO,
            ..FeedConfig::default()
        };
        let err = build_source(&config).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn fixture_source_is_selected_when_configured() {
        let config = FeedConfig {
            fixture: Some(Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/sample_quotes.json")),
            ..FeedConfig::default()
        };
        let source = build_source(&config).unwrap();
        assert_eq!(source.id(), "fixture");
    }
}
