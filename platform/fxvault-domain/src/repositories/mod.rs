pub mod quote_archive;
pub mod series_store;
