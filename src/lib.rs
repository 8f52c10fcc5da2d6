pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod filter;
pub mod pending;
pub mod runner;
pub mod scheduler;
pub mod watcher;

pub use engine::*;
pub use error::{ConfigError, WatchError};
pub use events::*;
pub use filter::*;
pub use pending::*;
pub use runner::*;
pub use scheduler::*;
pub use watcher::*;
