pub mod config;
pub mod ingest;
pub mod resampling;
pub mod storage;
