//! Series Store operations: write tables as chunks, read chunks back as series.

use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::series_store::{ChunkQuery, SeriesStore};
use fxvault_domain::services::chunking::{split_raw_year, split_resampled};
use fxvault_domain::services::infer::infer_frequency;
use fxvault_domain::services::reconstruct::{concat_chunks, join_fields};
use fxvault_domain::value_objects::chunk::{ChunkKey, SeriesChunk};
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::month_range::MonthRange;
use fxvault_domain::value_objects::ohlc::OhlcTable;
use fxvault_domain::value_objects::period::IngestPeriod;
use fxvault_domain::value_objects::price_field::PriceField;
use fxvault_domain::value_objects::series::FieldSeries;
use fxvault_domain::value_objects::series_kind::SeriesKind;
use std::time::Instant;
use tracing::info_span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub instrument: String,
    pub period: IngestPeriod,
    pub rows: usize,
    pub chunks_written: usize,
    /// Rows dated outside the declared year; never stored.
    pub out_of_period: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampledUpsert {
    pub instrument: String,
    pub frequency: Frequency,
    pub rows: usize,
    pub chunks_written: usize,
    pub dropped_incomplete: usize,
}

/// Stores raw minute bars for one archive period.
///
/// A full year is split per (UTC month, field) and written as one batch. Month
/// periods are refused before the store is touched.
pub fn upsert_raw(
    store: &dyn SeriesStore,
    instrument: &str,
    period: IngestPeriod,
    table: &OhlcTable,
) -> Result<IngestReport, StoreError> {
    let _span =
        info_span!("upsert_raw", instrument, period = %period, rows = table.len()).entered();

    let year = match period {
        IngestPeriod::FullYear(year) => year,
        IngestPeriod::Month { .. } => {
            return Err(StoreError::UnsupportedOperation(format!(
                "raw ingest of a single month ({instrument} {period}) is not supported"
            )))
        }
    };

    let stage_start = Instant::now();
    let split = split_raw_year(instrument, year, table)?;
    if split.out_of_period > 0 {
        tracing::warn!(
            out_of_period = split.out_of_period,
            year,
            "rows outside the declared year were not stored"
        );
    }

    let chunks_written = store.upsert_chunks(&split.chunks)?;
    metrics::histogram!("fxvault.store.upsert_raw_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    tracing::info!(chunks = chunks_written, "raw year stored");

    Ok(IngestReport {
        instrument: instrument.to_string(),
        period,
        rows: table.len() - split.out_of_period,
        chunks_written,
        out_of_period: split.out_of_period,
    })
}

/// Stores aggregated bars, tagging them with the spacing inferred from their
/// timestamps.
pub fn upsert_resampled(
    store: &dyn SeriesStore,
    instrument: &str,
    table: &OhlcTable,
) -> Result<ResampledUpsert, StoreError> {
    let frequency = infer_frequency(&table.timestamps()).ok_or_else(|| {
        StoreError::malformed(format!(
            "cannot infer frequency for {instrument} from {} rows",
            table.len()
        ))
    })?;
    upsert_resampled_as(store, instrument, frequency, table)
}

/// Stores aggregated bars under a known frequency, one chunk per (calendar
/// year, field). Rows missing any price are dropped first.
pub fn upsert_resampled_as(
    store: &dyn SeriesStore,
    instrument: &str,
    frequency: Frequency,
    table: &OhlcTable,
) -> Result<ResampledUpsert, StoreError> {
    let _span = info_span!(
        "upsert_resampled",
        instrument,
        freq = %frequency,
        rows = table.len()
    )
    .entered();

    let (complete, dropped_incomplete) = table.complete_rows();
    if dropped_incomplete > 0 {
        tracing::info!(dropped = dropped_incomplete, "dropped incomplete rows");
    }

    let chunks = split_resampled(instrument, frequency, &complete)?;
    let chunks_written = store.upsert_chunks(&chunks)?;
    tracing::info!(chunks = chunks_written, "resampled series stored");

    Ok(ResampledUpsert {
        instrument: instrument.to_string(),
        frequency,
        rows: complete.len(),
        chunks_written,
        dropped_incomplete,
    })
}

/// Exact raw chunk lookup.
pub fn get_one(
    store: &dyn SeriesStore,
    instrument: &str,
    frequency: Frequency,
    year: i32,
    month: u32,
    field: PriceField,
) -> Result<SeriesChunk, StoreError> {
    let key = ChunkKey::raw(instrument, field, frequency, year, month);
    store
        .find_one(&key)?
        .ok_or_else(|| StoreError::not_found(key.to_string()))
}

/// Raw series for the inclusive `YYYY-MM` month range. Empty when nothing
/// matches.
pub fn get_range(
    store: &dyn SeriesStore,
    instrument: &str,
    frequency: Frequency,
    begin: &str,
    end: &str,
    field: PriceField,
) -> Result<FieldSeries, StoreError> {
    let months = MonthRange::parse(begin, end).map_err(StoreError::malformed)?;
    load_field(
        store,
        &ChunkQuery {
            instrument: instrument.to_string(),
            kind: SeriesKind::Raw,
            field,
            frequency,
            months: Some(months),
        },
    )
}

/// Every stored chunk of one series, whatever its period.
pub fn get_all(
    store: &dyn SeriesStore,
    instrument: &str,
    kind: SeriesKind,
    frequency: Frequency,
    field: PriceField,
) -> Result<FieldSeries, StoreError> {
    load_field(
        store,
        &ChunkQuery {
            instrument: instrument.to_string(),
            kind,
            field,
            frequency,
            months: None,
        },
    )
}

/// The four price fields of one series joined on timestamp. Rows where a
/// field has no stored value keep `None` there.
pub fn get_ohlc(
    store: &dyn SeriesStore,
    instrument: &str,
    kind: SeriesKind,
    frequency: Frequency,
    months: Option<MonthRange>,
) -> Result<OhlcTable, StoreError> {
    let _span = info_span!("get_ohlc", instrument, kind = %kind, freq = %frequency).entered();
    let mut columns = Vec::with_capacity(PriceField::ALL.len());
    for field in PriceField::ALL {
        columns.push(load_field(
            store,
            &ChunkQuery {
                instrument: instrument.to_string(),
                kind,
                field,
                frequency,
                months,
            },
        )?);
    }
    join_fields(&columns)
}

fn load_field(store: &dyn SeriesStore, query: &ChunkQuery) -> Result<FieldSeries, StoreError> {
    let stage_start = Instant::now();
    let chunks = store.find_chunks(query)?;
    let series = concat_chunks(query.field, &chunks)?;
    metrics::histogram!("fxvault.store.load_series_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    tracing::debug!(
        instrument = %query.instrument,
        field = %query.field,
        chunks = chunks.len(),
        points = series.len(),
        "series loaded"
    );
    Ok(series)
}
