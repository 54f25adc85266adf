//! Splitting in-memory tables into storable chunks.
//!
//! Raw minute data is cut per (UTC month, field) so a single document never
//! holds more than a month of one column. Resampled data is cut per (calendar
//! year, field). Each chunk's range covers its own slice only.

use crate::errors::StoreError;
use crate::value_objects::chunk::{ChunkKey, SeriesChunk};
use crate::value_objects::frequency::Frequency;
use crate::value_objects::ohlc::{OhlcRow, OhlcTable};
use crate::value_objects::price_field::PriceField;
use chrono::Datelike;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RawSplit {
    pub chunks: Vec<SeriesChunk>,
    /// Rows whose UTC year differs from the declared ingest year.
    pub out_of_period: usize,
}

/// Splits a full year of raw minute bars. Every row must carry all four prices.
pub fn split_raw_year(
    instrument: &str,
    year: i32,
    table: &OhlcTable,
) -> Result<RawSplit, StoreError> {
    ensure_complete(table)?;

    let mut by_month: BTreeMap<u32, Vec<&OhlcRow>> = BTreeMap::new();
    let mut out_of_period = 0usize;
    for row in table.rows() {
        if row.timestamp.year() != year {
            out_of_period += 1;
            continue;
        }
        by_month.entry(row.timestamp.month()).or_default().push(row);
    }

    let mut chunks = Vec::with_capacity(by_month.len() * PriceField::ALL.len());
    for (month, rows) in by_month {
        for field in PriceField::ALL {
            let key = ChunkKey::raw(instrument, field, Frequency::MINUTE, year, month);
            chunks.push(field_chunk(key, &rows)?);
        }
    }

    Ok(RawSplit {
        chunks,
        out_of_period,
    })
}

/// Splits complete resampled bars into one chunk per (calendar year, field).
pub fn split_resampled(
    instrument: &str,
    frequency: Frequency,
    table: &OhlcTable,
) -> Result<Vec<SeriesChunk>, StoreError> {
    ensure_complete(table)?;

    let mut by_year: BTreeMap<i32, Vec<&OhlcRow>> = BTreeMap::new();
    for row in table.rows() {
        by_year.entry(row.timestamp.year()).or_default().push(row);
    }

    let mut chunks = Vec::with_capacity(by_year.len() * PriceField::ALL.len());
    for (year, rows) in by_year {
        for field in PriceField::ALL {
            let key = ChunkKey::resampled(instrument, field, frequency, year);
            chunks.push(field_chunk(key, &rows)?);
        }
    }
    Ok(chunks)
}

fn ensure_complete(table: &OhlcTable) -> Result<(), StoreError> {
    match table.rows().iter().find(|row| !row.is_complete()) {
        Some(row) => Err(StoreError::malformed(format!(
            "row at {} is missing a price field",
            row.timestamp.to_rfc3339()
        ))),
        None => Ok(()),
    }
}

fn field_chunk(key: ChunkKey, rows: &[&OhlcRow]) -> Result<SeriesChunk, StoreError> {
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let value = row.get(key.field).ok_or_else(|| {
            StoreError::malformed(format!(
                "row at {} is missing {}",
                row.timestamp.to_rfc3339(),
                key.field
            ))
        })?;
        timestamps.push(row.timestamp);
        values.push(value);
    }
    SeriesChunk::new(key, timestamps, values)
}

#[cfg(test)]
mod tests {
    use super::{split_raw_year, split_resampled};
    use crate::errors::StoreError;
    use crate::value_objects::frequency::Frequency;
    use crate::value_objects::ohlc::{OhlcRow, OhlcTable};
    use crate::value_objects::price_field::PriceField;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid date")
    }

    fn bar(ts: DateTime<Utc>, base: f64) -> OhlcRow {
        OhlcRow::complete(ts, base, base + 0.01, base - 0.01, base + 0.005, 10.0)
    }

    #[test]
    fn raw_year_is_cut_per_month_and_field_with_per_chunk_ranges() {
        let table = OhlcTable::new(vec![
            bar(at(2005, 1, 3, 0, 0), 1.30),
            bar(at(2005, 1, 31, 23, 59), 1.31),
            bar(at(2005, 3, 1, 0, 0), 1.32),
        ])
        .unwrap();

        let split = split_raw_year("EURUSD", 2005, &table).unwrap();
        assert_eq!(split.out_of_period, 0);
        // January and March only; February had no rows.
        assert_eq!(split.chunks.len(), 8);

        let jan_close = split
            .chunks
            .iter()
            .find(|c| c.key.month == Some(1) && c.key.field == PriceField::Close)
            .expect("january close");
        assert_eq!(jan_close.timestamps.len(), 2);
        assert_eq!(jan_close.range_start, at(2005, 1, 3, 0, 0));
        assert_eq!(jan_close.range_end, at(2005, 1, 31, 23, 59));
        assert_eq!(jan_close.key.frequency, Frequency::MINUTE);

        let mar_open = split
            .chunks
            .iter()
            .find(|c| c.key.month == Some(3) && c.key.field == PriceField::Open)
            .expect("march open");
        assert_eq!(mar_open.values, vec![1.32]);
        assert_eq!(mar_open.range_start, mar_open.range_end);
    }

    #[test]
    fn rows_outside_declared_year_are_excluded_and_counted() {
        let table = OhlcTable::new(vec![
            bar(at(2005, 12, 31, 23, 0), 1.30),
            bar(at(2006, 1, 1, 0, 0), 1.31),
        ])
        .unwrap();
        let split = split_raw_year("EURUSD", 2005, &table).unwrap();
        assert_eq!(split.out_of_period, 1);
        assert!(split.chunks.iter().all(|c| c.key.year == 2005 && c.key.month == Some(12)));
    }

    #[test]
    fn incomplete_rows_are_rejected_before_chunking() {
        let mut broken = bar(at(2005, 1, 3, 0, 1), 1.30);
        broken.high = None;
        let table = OhlcTable::new(vec![bar(at(2005, 1, 3, 0, 0), 1.30), broken]).unwrap();
        let err = split_raw_year("EURUSD", 2005, &table).expect_err("missing high");
        assert!(matches!(err, StoreError::MalformedInput(_)));
    }

    #[test]
    fn resampled_chunks_are_restricted_to_their_year() {
        let table = OhlcTable::new(vec![
            bar(at(2005, 12, 30, 0, 0), 1.30),
            bar(at(2006, 1, 2, 0, 0), 1.31),
            bar(at(2006, 1, 3, 0, 0), 1.32),
        ])
        .unwrap();
        let chunks = split_resampled("EURUSD", Frequency::DAY, &table).unwrap();
        assert_eq!(chunks.len(), 8);
        let close_2006 = chunks
            .iter()
            .find(|c| c.key.year == 2006 && c.key.field == PriceField::Close)
            .expect("2006 close");
        assert_eq!(close_2006.key.month, None);
        assert_eq!(close_2006.timestamps, vec![at(2006, 1, 2, 0, 0), at(2006, 1, 3, 0, 0)]);
        assert_eq!(close_2006.range_start, at(2006, 1, 2, 0, 0));
    }
}
