use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{parse_duration, parse_mask};
use crate::ChangeKind;

#[derive(Parser, Debug)]
#[command(name = "on-change")]
#[command(version)]
#[command(about = "Run a command whenever watched files change")]
#[command(long_about = "on-change watches the given files and directories (non-recursively) and runs CMD through $SHELL -c \
whenever they change. Bursts of changes are coalesced into one run after a quiet debounce period, the command is forced \
to rerun after a hard timeout even if nothing changed, and it runs once at startup. Changed paths are passed to the \
command as positional parameters ($1, $2, ...).")]
#[command(after_help = "Event mask letters:\n  c  create\n  w  write\n  r  remove\n  m  rename (move)\n  a  chmod (access)")]
pub struct Cli {
    /// Quiet period after the last change before running
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration, help = "Debounce time, e.g. 300ms (default: 300ms)")]
    pub debounce: Option<Duration>,

    /// Force a rerun after this long without one
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration, help = "Timeout time, e.g. 12h (default: 12h)")]
    pub timeout: Option<Duration>,

    /// Change kinds to react to
    #[arg(short = 'm', long = "events", visible_short_alias = 'e', value_name = "MASK", value_parser = parse_mask, help = "Event mask (default: cwrma)")]
    pub events: Option<ChangeKind>,

    /// Only react to files whose base name matches one of these globs
    #[arg(short = 'g', long = "glob", value_name = "GLOB", help = "Trigger only when the file basename matches a glob (repeatable)")]
    pub globs: Vec<String>,

    /// Clear the terminal before every run
    #[arg(short, long, help = "Clear the screen before running the command")]
    pub clear: bool,

    /// TOML settings file
    #[arg(long, value_name = "FILE", help = "Read defaults from a TOML settings file")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Paths to watch followed by the command to run
    #[arg(value_name = "FILES... CMD", num_args = 2.., required = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Everything but the last positional argument.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self.args.split_last() {
            Some((_, files)) => files.iter().map(PathBuf::from).collect(),
            None => Vec::new(),
        }
    }

    /// The last positional argument.
    pub fn command_line(&self) -> Option<&str> {
        if self.args.len() < 2 {
            return None;
        }
        self.args.last().map(String::as_str)
    }

    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}
