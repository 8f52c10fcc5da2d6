//! Configuration for on-change
//!
//! Settings come from four layers, later ones winning: built-in defaults,
//! an optional TOML settings file, `ONCHANGE_*` environment variables and
//! command-line flags. The result is an immutable [`Config`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::{ChangeFilter, ChangeKind, Timing};

/// Shell used when `$SHELL` is unset or empty.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Values that may be supplied by a settings file or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Debounce duration, e.g. "300ms"
    pub debounce: Option<String>,
    /// Hard timeout, e.g. "12h"
    pub timeout: Option<String>,
    /// Event mask letters, e.g. "cw"
    pub events: Option<String>,
    pub globs: Vec<String>,
    pub clear: bool,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadSettings {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override with environment variables if present
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("ONCHANGE_DEBOUNCE") {
            self.debounce = Some(val);
        }

        if let Ok(val) = std::env::var("ONCHANGE_TIMEOUT") {
            self.timeout = Some(val);
        }

        if let Ok(val) = std::env::var("ONCHANGE_EVENTS") {
            self.events = Some(val);
        }
    }
}

/// Everything the binary needs to start watching.
#[derive(Debug, Clone)]
pub struct Config {
    pub timing: Timing,
    pub filter: ChangeFilter,
    pub shell: String,
    pub paths: Vec<PathBuf>,
    pub command: String,
    pub clear: bool,
}

impl Config {
    /// Read the settings file named on the command line (if any), apply the
    /// environment, then the flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_env();

        Self::resolve(cli, &settings, shell_from_env())
    }

    pub fn resolve(cli: &Cli, settings: &Settings, shell: String) -> Result<Self, ConfigError> {
        let defaults = Timing::default();

        let debounce = match cli.debounce {
            Some(debounce) => debounce,
            None => parse_setting(settings.debounce.as_deref(), parse_duration)?.unwrap_or(defaults.debounce),
        };
        let timeout = match cli.timeout {
            Some(timeout) => timeout,
            None => parse_setting(settings.timeout.as_deref(), parse_duration)?.unwrap_or(defaults.timeout),
        };
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let mask = match cli.events {
            Some(mask) => mask,
            None => parse_setting(settings.events.as_deref(), parse_mask)?.unwrap_or(ChangeKind::ALL),
        };
        let globs = if cli.globs.is_empty() {
            &settings.globs
        } else {
            &cli.globs
        };
        let filter = ChangeFilter::with_globs(mask, globs)?;

        let paths = cli.paths();
        if paths.is_empty() {
            return Err(ConfigError::NoPaths);
        }
        let command = cli.command_line().ok_or(ConfigError::NoCommand)?.to_string();

        Ok(Self {
            timing: Timing { debounce, timeout },
            filter,
            shell,
            paths,
            command,
            clear: cli.clear || settings.clear,
        })
    }
}

fn parse_setting<T>(
    value: Option<&str>,
    parse: fn(&str) -> Result<T, ConfigError>,
) -> Result<Option<T>, ConfigError> {
    value.map(parse).transpose()
}

/// `$SHELL`, or [`DEFAULT_SHELL`] when it is unset or empty.
pub fn shell_from_env() -> String {
    shell_or_default(std::env::var("SHELL").ok())
}

fn shell_or_default(shell: Option<String>) -> String {
    shell
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Parse mask letters: `c` create, `w` write, `r` remove, `m` rename,
/// `a` chmod.
pub fn parse_mask(input: &str) -> Result<ChangeKind, ConfigError> {
    input.chars().try_fold(ChangeKind::empty(), |mask, letter| {
        ChangeKind::from_letter(letter)
            .map(|kind| mask | kind)
            .ok_or(ConfigError::InvalidMask(letter))
    })
}

/// Parse a duration such as `300ms`, `1.5s` or `1h30m`.
///
/// A duration is one or more decimal numbers, each followed by a unit:
/// `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is also accepted.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let invalid = |reason| ConfigError::InvalidDuration {
        input: input.to_string(),
        reason,
    };

    let s = input.strip_prefix('+').unwrap_or(input);
    if s.starts_with('-') {
        return Err(invalid("negative durations are not allowed"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid("empty duration"));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let (number, tail) = rest.split_at(rest.find(|c| !is_number(c)).unwrap_or(rest.len()));
        let (unit, tail) = tail.split_at(tail.find(is_number).unwrap_or(tail.len()));
        rest = tail;

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 60 * 60 * NANOS_PER_SEC,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(invalid("expected a number"));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("number out of range"))?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(|| invalid("number out of range"))?;

        let mut place = scale;
        for digit in fraction.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            nanos += u128::from(digit - b'0') * place;
        }

        total = total.checked_add(nanos).ok_or_else(|| invalid("number out of range"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid("number out of range"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
