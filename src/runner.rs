use std::ffi::OsString;
use std::io::{self, Stdout, Write};
use std::process::Command;

use crate::{Batch, CommandRunner};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Runs the command through `shell -c`, passing changed paths as
/// positional parameters. `terminal` receives the clear-screen sequence.
#[derive(Debug)]
pub struct ShellRunner<W = Stdout> {
    shell: String,
    command: String,
    clear: bool,
    terminal: W,
}

impl ShellRunner<Stdout> {
    pub fn new(shell: impl Into<String>, command: impl Into<String>, clear: bool) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
            clear,
            terminal: io::stdout(),
        }
    }
}

impl<W: Write> ShellRunner<W> {
    pub fn with_terminal<T: Write>(self, terminal: T) -> ShellRunner<T> {
        ShellRunner {
            shell: self.shell,
            command: self.command,
            clear: self.clear,
            terminal,
        }
    }

    /// Most shells take the first word after `-c CMD` as `$0`, so the shell
    /// name is inserted there and paths start at `$1`. es and rc put it in
    /// `$*` instead and are left without it.
    fn wants_argv0(&self) -> bool {
        !(self.shell.ends_with("es") || self.shell.ends_with("rc"))
    }

    pub fn args(&self, batch: &Batch) -> Vec<OsString> {
        let mut args = Vec::with_capacity(batch.changes.len() + 3);
        args.push(OsString::from("-c"));
        args.push(OsString::from(&self.command));
        if self.wants_argv0() {
            args.push(OsString::from(&self.shell));
        }
        args.extend(batch.changes.keys().map(|path| path.as_os_str().to_os_string()));
        args
    }

    fn clear_screen(&mut self) {
        let written = self
            .terminal
            .write_all(CLEAR_SCREEN.as_bytes())
            .and_then(|_| self.terminal.flush());
        if let Err(err) = written {
            tracing::warn!("Failed to clear screen: {}", err);
        }
    }
}

impl<W: Write> CommandRunner for ShellRunner<W> {
    fn run(&mut self, batch: &Batch) {
        if self.clear {
            self.clear_screen();
        }

        tracing::debug!("Running `{}` via {} ({})", self.command, self.shell, batch.reason);
        match Command::new(&self.shell).args(self.args(batch)).status() {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!("Command exited with {}", status),
            Err(err) => tracing::error!("Failed to run {}: {}", self.shell, err),
        }
    }
}
