use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::engine::FallbackMode;

/// Runtime settings, read from `VACANCY_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interpreter used to launch the crawler script.
    pub crawler_runtime: String,
    pub crawler_script: String,
    /// Working directory of the crawler process.
    pub crawler_dir: PathBuf,
    /// Results file written by the crawler, relative to `crawler_dir` unless absolute.
    pub results_file: PathBuf,
    pub crawl_timeout: Duration,
    /// JSON catalog seed loaded at startup.
    pub catalog_path: PathBuf,
    pub fallback_mode: FallbackMode,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler_runtime: "node".into(),
            crawler_script: "realtime-crawler-parent.js".into(),
            crawler_dir: PathBuf::from("./crawler"),
            results_file: PathBuf::from("results.json"),
            crawl_timeout: Duration::from_secs(300),
            catalog_path: PathBuf::from("./catalog.json"),
            fallback_mode: FallbackMode::Duplicate,
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = lookup("VACANCY_CRAWLER_RUNTIME") {
            config.crawler_runtime = v;
        }
        if let Some(v) = lookup("VACANCY_CRAWLER_SCRIPT") {
            config.crawler_script = v;
        }
        if let Some(v) = lookup("VACANCY_CRAWLER_DIR") {
            config.crawler_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("VACANCY_RESULTS_FILE") {
            config.results_file = PathBuf::from(v);
        }
        if let Some(secs) = parsed(&lookup, "VACANCY_CRAWL_TIMEOUT_SECS") {
            config.crawl_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("VACANCY_CATALOG") {
            config.catalog_path = PathBuf::from(v);
        }
        if let Some(mode) = parsed(&lookup, "VACANCY_FALLBACK_MODE") {
            config.fallback_mode = mode;
        }
        config.metrics_port = parsed(&lookup, "VACANCY_METRICS_PORT");
        config
    }

    pub fn results_path(&self) -> PathBuf {
        self.crawler_dir.join(&self.results_file)
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring unparsable {key}={raw:?}");
            None
        }
    }
}
