use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum EngineError {
    /// The scraper process could not be started.
    Spawn(std::io::Error),
    /// Reading the scraper's output or results file failed.
    Io(std::io::Error),
    /// The scraper exited without leaving a results file.
    MissingResults(PathBuf),
    /// The results file is not the expected JSON array.
    Decode(String),
    Timeout {
        partition: String,
        after: Duration,
    },
    InvalidWindow(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Spawn(e) => write!(f, "failed to start crawler: {e}"),
            EngineError::Io(e) => write!(f, "crawler I/O error: {e}"),
            EngineError::MissingResults(path) => {
                write!(f, "crawler produced no results file at {}", path.display())
            }
            EngineError::Decode(e) => write!(f, "malformed crawler results: {e}"),
            EngineError::Timeout { partition, after } => {
                write!(f, "crawl of {partition} timed out after {}s", after.as_secs())
            }
            EngineError::InvalidWindow(msg) => write!(f, "invalid request window: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Spawn(e) | EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}
