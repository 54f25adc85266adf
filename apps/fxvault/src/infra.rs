use fxvault_application::config::Config;
use fxvault_infrastructure::market_data::histdata::HistdataArchive;
use fxvault_infrastructure::persistence::postgres_series::PostgresSeriesStore;
use std::env;
use std::path::PathBuf;

const DEFAULT_POOL_MAX_SIZE: u32 = 4;

fn resolve_db_url(config: &Config) -> Result<String, String> {
    match config.db.url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
        _ => env::var("FXVAULT_DB_URL")
            .map_err(|_| "missing db.url in config and env FXVAULT_DB_URL is not set".to_string()),
    }
}

pub fn build_store(config: &Config) -> Result<PostgresSeriesStore, String> {
    let db_url = resolve_db_url(config)?;
    let pool_max_size = config.db.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE);
    PostgresSeriesStore::new(db_url, config.db.table_name().to_string(), pool_max_size)
}

pub fn build_archive(
    config: &Config,
    override_dir: Option<PathBuf>,
) -> Result<HistdataArchive, String> {
    let dir = match override_dir {
        Some(dir) => dir,
        None => config
            .ingest
            .as_ref()
            .map(|ingest| PathBuf::from(&ingest.archive_dir))
            .ok_or_else(|| {
                "missing [ingest] archive_dir in config and no --archive-dir".to_string()
            })?,
    };
    if !dir.is_dir() {
        return Err(format!("archive dir {} does not exist", dir.display()));
    }
    Ok(HistdataArchive::new(dir))
}
