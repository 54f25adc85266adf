use crate::resampling::SeriesSource;
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::series_kind::SeriesKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TABLE: &str = "forex";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Development,
    Production,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub db: DbConfig,
    pub ingest: Option<IngestConfig>,
    pub resample: Option<ResampleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    /// Falls back to `FXVAULT_DB_URL` when omitted.
    pub url: Option<String>,
    pub table: Option<String>,
    pub pool_max_size: Option<u32>,
    pub profile: Option<Profile>,
}

impl DbConfig {
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    pub fn profile(&self) -> Profile {
        self.profile.unwrap_or(Profile::Development)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    pub archive_dir: String,
    pub currencies: Vec<String>,
    pub years: Vec<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResampleConfig {
    pub currencies: Vec<String>,
    pub source_kind: Option<SeriesKind>,
    pub source_freq: Option<String>,
    pub targets: Vec<String>,
}

impl ResampleConfig {
    pub fn source(&self) -> Result<SeriesSource, String> {
        let mut source = SeriesSource::raw_minutes();
        if let Some(kind) = self.source_kind {
            source.kind = kind;
        }
        if let Some(freq) = &self.source_freq {
            source.frequency = Frequency::parse(freq)
                .map_err(|err| format!("resample.source_freq: {err}"))?;
        }
        Ok(source)
    }

    pub fn target_frequencies(&self) -> Result<Vec<Frequency>, String> {
        if self.targets.is_empty() {
            return Err("resample.targets must not be empty".to_string());
        }
        self.targets
            .iter()
            .map(|target| {
                Frequency::parse(target).map_err(|err| format!("resample.targets: {err}"))
            })
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))
}

/// Writes against a production database are announced loudly.
pub fn announce_profile(config: &Config) {
    match config.db.profile() {
        Profile::Production => tracing::warn!(
            table = %config.db.table_name(),
            "PRODUCTION profile: writes go to the production database"
        ),
        Profile::Development => tracing::info!(
            table = %config.db.table_name(),
            "development profile"
        ),
    }
}
