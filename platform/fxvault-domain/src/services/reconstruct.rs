use crate::errors::StoreError;
use crate::value_objects::chunk::SeriesChunk;
use crate::value_objects::ohlc::{OhlcRow, OhlcTable};
use crate::value_objects::price_field::PriceField;
use crate::value_objects::series::{FieldSeries, SeriesPoint};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Concatenates chunks of one field into an ordered series. On overlapping
/// timestamps the chunk that comes later in `chunks` wins.
pub fn concat_chunks(field: PriceField, chunks: &[SeriesChunk]) -> Result<FieldSeries, StoreError> {
    let mut merged: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for chunk in chunks {
        if chunk.key.field != field {
            return Err(StoreError::malformed(format!(
                "chunk {} does not belong to field {field}",
                chunk.key
            )));
        }
        for point in chunk.points() {
            merged.insert(point.timestamp, point.value);
        }
    }
    Ok(FieldSeries {
        field,
        points: merged
            .into_iter()
            .map(|(timestamp, value)| SeriesPoint { timestamp, value })
            .collect(),
    })
}

/// Outer join of single-field series on timestamp. Fields that have no value at
/// a timestamp stay `None` in that row.
pub fn join_fields(series: &[FieldSeries]) -> Result<OhlcTable, StoreError> {
    let mut seen: Vec<PriceField> = Vec::with_capacity(series.len());
    let mut rows: BTreeMap<DateTime<Utc>, OhlcRow> = BTreeMap::new();
    for column in series {
        if seen.contains(&column.field) {
            return Err(StoreError::malformed(format!(
                "field {} supplied more than once",
                column.field
            )));
        }
        seen.push(column.field);
        for point in &column.points {
            rows.entry(point.timestamp)
                .or_insert_with(|| OhlcRow::empty(point.timestamp))
                .set(column.field, Some(point.value));
        }
    }
    OhlcTable::new(rows.into_values().collect())
}

/// Joins columns that must share one index exactly. Any difference in
/// timestamps between columns is an error rather than a silent gap.
pub fn zip_aligned(series: &[FieldSeries]) -> Result<OhlcTable, StoreError> {
    let Some(reference) = series.first() else {
        return Ok(OhlcTable::default());
    };
    let index = reference.timestamps();
    for column in &series[1..] {
        if column.timestamps() != index {
            return Err(StoreError::malformed(format!(
                "bucket index of {} ({} rows) does not match {} ({} rows)",
                column.field,
                column.len(),
                reference.field,
                reference.len()
            )));
        }
    }
    join_fields(series)
}

#[cfg(test)]
mod tests {
    use super::{concat_chunks, join_fields, zip_aligned};
    use crate::value_objects::chunk::{ChunkKey, SeriesChunk};
    use crate::value_objects::frequency::Frequency;
    use crate::value_objects::price_field::PriceField;
    use crate::value_objects::series::{FieldSeries, SeriesPoint};
    use chrono::{DateTime, Utc};

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).expect("valid timestamp")
    }

    fn series(field: PriceField, points: &[(i64, f64)]) -> FieldSeries {
        FieldSeries {
            field,
            points: points
                .iter()
                .map(|(s, v)| SeriesPoint {
                    timestamp: ts(*s),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn concat_orders_across_chunks() {
        let feb = SeriesChunk::new(
            ChunkKey::raw("EURUSD", PriceField::Close, Frequency::MINUTE, 2005, 2),
            vec![ts(200), ts(260)],
            vec![2.0, 2.1],
        )
        .unwrap();
        let jan = SeriesChunk::new(
            ChunkKey::raw("EURUSD", PriceField::Close, Frequency::MINUTE, 2005, 1),
            vec![ts(100), ts(160)],
            vec![1.0, 1.1],
        )
        .unwrap();
        let out = concat_chunks(PriceField::Close, &[feb, jan]).unwrap();
        assert_eq!(out.timestamps(), vec![ts(100), ts(160), ts(200), ts(260)]);
        assert_eq!(out.values(), vec![1.0, 1.1, 2.0, 2.1]);
    }

    #[test]
    fn concat_rejects_foreign_field() {
        let open = SeriesChunk::new(
            ChunkKey::raw("EURUSD", PriceField::Open, Frequency::MINUTE, 2005, 1),
            vec![ts(100)],
            vec![1.0],
        )
        .unwrap();
        assert!(concat_chunks(PriceField::Close, &[open]).is_err());
    }

    #[test]
    fn join_keeps_gaps_as_none() {
        let table = join_fields(&[
            series(PriceField::Open, &[(0, 1.0), (60, 1.1)]),
            series(PriceField::Close, &[(60, 1.2)]),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].close, None);
        assert_eq!(table.rows()[1].close, Some(1.2));
        assert!(join_fields(&[
            series(PriceField::Open, &[(0, 1.0)]),
            series(PriceField::Open, &[(0, 1.0)]),
        ])
        .is_err());
    }

    #[test]
    fn zip_aligned_fails_loudly_on_index_mismatch() {
        let err = zip_aligned(&[
            series(PriceField::Open, &[(0, 1.0), (60, 1.1)]),
            series(PriceField::High, &[(0, 1.0)]),
        ])
        .expect_err("mismatch");
        assert!(err.to_string().contains("bucket index"));
    }
}
