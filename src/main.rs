use anyhow::Result;
use clap::Parser;

use onchange::{
    cli::Cli,
    config::Config,
    watcher::{FileWatcher, DEFAULT_QUEUE_CAPACITY},
    LogReporter, ShellRunner, TriggerEngine,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };

    let mut reporter = LogReporter;
    let mut watcher = FileWatcher::new(DEFAULT_QUEUE_CAPACITY)?;
    if let Err(err) = watcher.watch_all(&config.paths, &mut reporter) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    tracing::debug!(
        "debounce {:?}, timeout {:?}, events {}, shell {}",
        config.timing.debounce,
        config.timing.timeout,
        config.filter.mask(),
        config.shell
    );

    let runner = ShellRunner::new(config.shell, config.command, config.clear);
    let mut engine = TriggerEngine::new(config.filter, config.timing, runner, reporter);
    engine.run(&mut watcher);

    Ok(())
}
