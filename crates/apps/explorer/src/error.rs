//! CLI errors and their exit behavior.

use std::process;

use geosearch::FetchError;
use overlay::{ControllerClosed, LocationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Controller(#[from] ControllerClosed),
    #[error("background task failed: {0}")]
    Task(String),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Prints the error (plus a hint where one helps) and exits with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {self}");
        match self {
            CliError::Location(LocationError::Unavailable(_)) => {
                eprintln!();
                eprintln!("Pass --location LAT,LON or set EXPLORER_LOCATION.");
            }
            CliError::Fetch(FetchError::FetchFailed(_)) => {
                eprintln!();
                eprintln!("Check network access to the encyclopedia host (--host / EXPLORER_HOST).");
            }
            _ => {}
        }
        process::exit(1)
    }
}
