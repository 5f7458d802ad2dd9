use clap::{command, Command};
use jersey_dataset::config::DownloadConfig;
use jersey_dataset::fetch::HttpFetcher;
use jersey_dataset::{download_all, logging};
use tracing::info;

fn cli() -> Command {
    command!()
        .name("dataset_download")
        .about("Download jersey images from the JSONL annotations into dataset/{split}/{label}/")
}

fn main() -> anyhow::Result<()> {
    cli().get_matches();
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = DownloadConfig::from_env();
    let fetcher = HttpFetcher::new(config.retry.timeout)?;

    let results = download_all(&fetcher, &config);
    for (split, stats) in results {
        info!(
            "{split}: {}/{} downloaded, {} bad lines, {} failed",
            stats.downloaded, stats.records, stats.malformed, stats.failed
        );
    }
    Ok(())
}
