use crate::storage::{get_all, upsert_resampled_as};
use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::series_store::SeriesStore;
use fxvault_domain::services::reconstruct::join_fields;
use fxvault_domain::services::resample::resample_table;
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::price_field::PriceField;
use fxvault_domain::value_objects::series_kind::SeriesKind;
use std::time::Instant;
use tracing::info_span;

/// Where a resampling run reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSource {
    pub kind: SeriesKind,
    pub frequency: Frequency,
}

impl SeriesSource {
    pub fn raw_minutes() -> Self {
        Self {
            kind: SeriesKind::Raw,
            frequency: Frequency::MINUTE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleSummary {
    pub instrument: String,
    pub source: SeriesSource,
    pub target: Frequency,
    pub source_rows: usize,
    /// Source rows left out because at least one price was missing.
    pub dropped_incomplete: usize,
    pub bars: usize,
    pub chunks_written: usize,
}

/// Reads one instrument's series, aggregates it to `target` and stores the
/// result as a resampled series tagged with `target`.
pub fn resample_series(
    store: &dyn SeriesStore,
    instrument: &str,
    source: SeriesSource,
    target: Frequency,
) -> Result<ResampleSummary, StoreError> {
    let _span = info_span!(
        "resample_series",
        instrument,
        source_kind = %source.kind,
        source_freq = %source.frequency,
        target = %target
    )
    .entered();

    if !target.is_coarser_multiple_of(source.frequency) {
        return Err(StoreError::malformed(format!(
            "target frequency {target} must be a coarser whole multiple of {}",
            source.frequency
        )));
    }

    let stage_start = Instant::now();
    let mut columns = Vec::with_capacity(PriceField::ALL.len());
    for field in PriceField::ALL {
        columns.push(get_all(store, instrument, source.kind, source.frequency, field)?);
    }
    let joined = join_fields(&columns)?;
    metrics::histogram!("fxvault.resample.load_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let mut summary = ResampleSummary {
        instrument: instrument.to_string(),
        source,
        target,
        source_rows: joined.len(),
        dropped_incomplete: 0,
        bars: 0,
        chunks_written: 0,
    };
    if joined.is_empty() {
        return Ok(summary);
    }

    let resample_start = Instant::now();
    let outcome = resample_table(&joined, target)?;
    metrics::histogram!("fxvault.resample.aggregate_ms")
        .record(resample_start.elapsed().as_millis() as f64);
    if outcome.dropped_incomplete > 0 {
        tracing::warn!(
            dropped = outcome.dropped_incomplete,
            "source rows missing a price were excluded"
        );
    }

    let written = upsert_resampled_as(store, instrument, target, &outcome.table)?;
    summary.dropped_incomplete = outcome.dropped_incomplete;
    summary.bars = written.rows;
    summary.chunks_written = written.chunks_written;
    tracing::info!(
        source_rows = summary.source_rows,
        bars = summary.bars,
        chunks = summary.chunks_written,
        "resampled"
    );
    Ok(summary)
}

/// Runs [`resample_series`] for every instrument and target. Instruments with
/// no source data are skipped; the first error aborts the batch.
pub fn resample_all(
    store: &dyn SeriesStore,
    instruments: &[String],
    source: SeriesSource,
    targets: &[Frequency],
) -> Result<Vec<ResampleSummary>, StoreError> {
    let mut summaries = Vec::with_capacity(instruments.len() * targets.len());
    for instrument in instruments {
        for target in targets {
            let summary = resample_series(store, instrument, source, *target)?;
            if summary.source_rows == 0 {
                tracing::info!(
                    instrument = %instrument,
                    source_kind = %source.kind,
                    source_freq = %source.frequency,
                    "no source data; skipped"
                );
                break;
            }
            summaries.push(summary);
        }
    }
    Ok(summaries)
}
