use std::sync::Arc;

use tracing::{info, warn};

use vacancy::catalog::InMemoryCatalog;
use vacancy::config::Config;
use vacancy::engine::{Engine, FallbackSearch, RandomPicker};
use vacancy::model::RequestWindow;
use vacancy::source::CrawlerProcess;

const USAGE: &str = "usage: vacancy <yyyy-MM-dd> <HH:mm:ss> <HH:mm:ss> <district[,district...]>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the JSON answer; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = Config::from_env();
    vacancy::observability::init(config.metrics_port)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [date, start_time, end_time, partitions] = args.as_slice() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let window = RequestWindow::from_parts(date, start_time, end_time)?;

    let catalog = if config.catalog_path.exists() {
        InMemoryCatalog::from_path(&config.catalog_path)?
    } else {
        warn!("catalog {} not found, starting empty", config.catalog_path.display());
        InMemoryCatalog::new()
    };
    info!(
        "catalog: {} venues, {} rooms",
        catalog.group_count(),
        catalog.room_count()
    );
    info!(
        "  crawler: {} {} in {}",
        config.crawler_runtime,
        config.crawler_script,
        config.crawler_dir.display()
    );
    info!("  crawl timeout: {}s", config.crawl_timeout.as_secs());
    info!("  fallback: {:?}", config.fallback_mode);

    let engine = Engine::new(
        Arc::new(CrawlerProcess::new(&config)),
        Arc::new(catalog),
        FallbackSearch::new(Box::new(RandomPicker), config.fallback_mode),
    );

    let rooms = engine.find_available_rooms(&window, partitions).await?;
    println!("{}", serde_json::to_string_pretty(&rooms)?);
    Ok(())
}
