//! Command-line parsing for the market pulse dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_QUOTE_URL, FeedConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about = "Treasury curve, futures and FX dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (default).
    Tui(TuiArgs),
    /// Run a single refresh cycle and print the snapshot.
    Once(OnceArgs),
    /// Run the scheduler headless and print one line per published snapshot.
    Watch(WatchArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct FeedArgs {
    /// Refresh interval in milliseconds.
    #[arg(long, env = "PULSE_INTERVAL_MS", default_value_t = 30_000)]
    pub interval_ms: u64,

    /// Timeout for each domain fetch, in milliseconds.
    #[arg(long, env = "PULSE_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Quote web service endpoint.
    #[arg(long, env = "PULSE_QUOTE_URL", default_value = DEFAULT_QUOTE_URL)]
    pub quote_url: String,

    /// Read quotes from a JSON fixture instead of the network.
    #[arg(long, value_name = "JSON")]
    pub fixture: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl FeedArgs {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            refresh_interval: Duration::from_millis(self.interval_ms),
            fetch_timeout: Duration::from_millis(self.timeout_ms),
            quote_url: self.quote_url.clone(),
            fixture: self.fixture.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub feed: FeedArgs,
}

#[derive(Debug, Args, Clone)]
pub struct OnceArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Print the snapshot as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Also write the snapshot JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Yield curve plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Yield curve plot height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Stop after this many published snapshots.
    #[arg(long)]
    pub cycles: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_thirty_second_refresh() {
        let cli = Cli::parse_from(["pulse", "once"]);
        let Command::Once(args) = cli.command else {
            panic!("expected once");
        };
        let config = args.feed.feed_config();
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert!(!args.json);
    }

    #[test]
    fn watch_accepts_fixture_and_cycles() {
        let argv = "pulse watch --fixture q.json --cycles 3 --interval-ms 500";
        let cli = Cli::parse_from(argv.split_whitespace());
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.cycles, Some(3));
        assert_eq!(args.feed.fixture, Some(PathBuf::from("q.json")));
        let config = args.feed.feed_config();
        assert_eq!(config.refresh_interval, Duration::from_millis(500));
    }
}
