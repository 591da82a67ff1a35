use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::EngineError;
use crate::model::RawSlotResult;

/// Live availability for every room in one district on one date.
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// `date` is `yyyy-MM-dd`. Any error is fatal for the whole search.
    async fn fetch(&self, partition: &str, date: &str) -> Result<Vec<RawSlotResult>, EngineError>;
}

/// Decode the scraper's results file: a JSON array of [`RawSlotResult`].
pub fn decode_results(bytes: &[u8]) -> Result<Vec<RawSlotResult>, EngineError> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::Decode(e.to_string()))
}

// ── Scraper subprocess ───────────────────────────────────────────

/// Runs `<runtime> <script> <partition> <date>` in the crawler directory and
/// reads the results file it leaves behind.
///
/// The results path is shared by every run, so runs are serialized.
pub struct CrawlerProcess {
    runtime: String,
    script: String,
    working_dir: PathBuf,
    results_path: PathBuf,
    timeout: Duration,
    lock: Mutex<()>,
}

impl CrawlerProcess {
    pub fn new(config: &Config) -> Self {
        Self {
            runtime: config.crawler_runtime.clone(),
            script: config.crawler_script.clone(),
            working_dir: config.crawler_dir.clone(),
            results_path: config.results_path(),
            timeout: config.crawl_timeout,
            lock: Mutex::new(()),
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    async fn run(&self, partition: &str, date: &str) -> Result<Vec<RawSlotResult>, EngineError> {
        // A crawler that dies before writing must not hand us the previous run's data.
        match tokio::fs::remove_file(&self.results_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(EngineError::Io(e)),
        }

        let mut child = Command::new(&self.runtime)
            .arg(&self.script)
            .arg(partition)
            .arg(date)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await.map_err(EngineError::Io)? {
                debug!(partition, "crawler: {line}");
            }
        }

        let status = child.wait().await.map_err(EngineError::Io)?;
        if !status.success() {
            warn!(partition, %status, "crawler exited unsuccessfully, reading results anyway");
        }

        let bytes = match tokio::fs::read(&self.results_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EngineError::MissingResults(self.results_path.clone()));
            }
            Err(e) => return Err(EngineError::Io(e)),
        };
        decode_results(&bytes)
    }
}

#[async_trait]
impl SlotSource for CrawlerProcess {
    async fn fetch(&self, partition: &str, date: &str) -> Result<Vec<RawSlotResult>, EngineError> {
        let _guard = self.lock.lock().await;
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.timeout, self.run(partition, date))
            .await
            .unwrap_or_else(|_| {
                Err(EngineError::Timeout {
                    partition: partition.to_string(),
                    after: self.timeout,
                })
            });

        let status = if outcome.is_ok() { "ok" } else { "error" };
        metrics::counter!(crate::observability::CRAWLS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(crate::observability::CRAWL_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        if let Ok(results) = &outcome {
            info!(partition, date, results = results.len(), "crawl finished");
        }
        outcome
    }
}

// ── Fixed results ────────────────────────────────────────────────

/// Serves canned results per partition, ignoring the date.
/// Unknown partitions yield an empty list.
#[derive(Default)]
pub struct StaticSource {
    results: DashMap<String, Vec<RawSlotResult>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, partition: &str, results: Vec<RawSlotResult>) -> Self {
        self.results.insert(partition.to_string(), results);
        self
    }
}

#[async_trait]
impl SlotSource for StaticSource {
    async fn fetch(&self, partition: &str, _date: &str) -> Result<Vec<RawSlotResult>, EngineError> {
        Ok(self
            .results
            .get(partition)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}
