use crate::storage::{upsert_raw, IngestReport};
use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::quote_archive::QuoteArchive;
use fxvault_domain::repositories::series_store::SeriesStore;
use fxvault_domain::value_objects::period::IngestPeriod;
use tracing::info_span;

/// Loads every full-year archive file for `instruments` × `years` and stores
/// it as raw chunks. Periods with no file are skipped. Each file is its own
/// batch; an error stops the loop with earlier files already stored.
pub fn ingest_archive(
    store: &dyn SeriesStore,
    archive: &dyn QuoteArchive,
    instruments: &[String],
    years: &[i32],
) -> Result<Vec<IngestReport>, StoreError> {
    let _span = info_span!(
        "ingest_archive",
        instruments = instruments.len(),
        years = years.len()
    )
    .entered();

    let mut reports = Vec::new();
    for instrument in instruments {
        for year in years {
            let period = IngestPeriod::FullYear(*year);
            let Some(table) = archive.load(instrument, period)? else {
                tracing::info!(
                    instrument = %instrument,
                    period = %period,
                    "no archive file; skipped"
                );
                metrics::counter!("fxvault.ingest.files_total", "result" => "missing").increment(1);
                continue;
            };
            let report = upsert_raw(store, instrument, period, &table)?;
            metrics::counter!("fxvault.ingest.files_total", "result" => "stored").increment(1);
            metrics::counter!("fxvault.ingest.rows_total").increment(report.rows as u64);
            reports.push(report);
        }
    }
    Ok(reports)
}
