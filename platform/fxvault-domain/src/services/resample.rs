use crate::errors::StoreError;
use crate::services::reconstruct::zip_aligned;
use crate::value_objects::frequency::{Frequency, SECS_PER_DAY};
use crate::value_objects::ohlc::OhlcTable;
use crate::value_objects::price_field::PriceField;
use crate::value_objects::series::{FieldSeries, SeriesPoint};
use chrono::{DateTime, Utc};

/// Shift that makes Monday 1969-12-29 the first weekly bucket boundary.
const WEEK_MONDAY_ANCHOR_OFFSET_SECS: i64 = 3 * SECS_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    First,
    Max,
    Min,
    Last,
}

impl Reducer {
    fn fold(self, acc: f64, next: f64) -> f64 {
        match self {
            Reducer::First => acc,
            Reducer::Max => acc.max(next),
            Reducer::Min => acc.min(next),
            Reducer::Last => next,
        }
    }
}

/// The aggregation rule for each price column. High and low must never share
/// the open/close rule or the bars stop bounding their own prices.
pub fn reducer_for(field: PriceField) -> Reducer {
    match field {
        PriceField::Open => Reducer::First,
        PriceField::High => Reducer::Max,
        PriceField::Low => Reducer::Min,
        PriceField::Close => Reducer::Last,
    }
}

/// Left edge of the bucket containing `ts`. Buckets are aligned to the Unix
/// epoch, except weekly multiples which start on Monday 00:00 UTC.
pub fn bucket_start(ts: DateTime<Utc>, target: Frequency) -> DateTime<Utc> {
    let step = target.step_seconds();
    let secs = ts.timestamp();
    let start = if target.is_weekly() {
        let shifted = secs + WEEK_MONDAY_ANCHOR_OFFSET_SECS;
        shifted - shifted.rem_euclid(step) - WEEK_MONDAY_ANCHOR_OFFSET_SECS
    } else {
        secs - secs.rem_euclid(step)
    };
    DateTime::from_timestamp(start, 0).unwrap_or(ts)
}

/// Aggregates one ordered column into `target` buckets with the given reducer.
/// Only non-empty buckets are emitted.
pub fn resample_field(series: &FieldSeries, target: Frequency, reducer: Reducer) -> FieldSeries {
    let mut points: Vec<SeriesPoint> = Vec::new();
    let mut bucket: Option<SeriesPoint> = None;

    for point in &series.points {
        let start = bucket_start(point.timestamp, target);
        match bucket.as_mut() {
            Some(agg) if agg.timestamp == start => {
                agg.value = reducer.fold(agg.value, point.value);
            }
            _ => {
                if let Some(done) = bucket.take() {
                    points.push(done);
                }
                bucket = Some(SeriesPoint {
                    timestamp: start,
                    value: point.value,
                });
            }
        }
    }

    if let Some(done) = bucket {
        points.push(done);
    }

    FieldSeries {
        field: series.field,
        points,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResampleOutcome {
    pub table: OhlcTable,
    /// Input rows discarded because a price was missing.
    pub dropped_incomplete: usize,
}

/// Drops incomplete rows, aggregates each price column with its own reducer and
/// reassembles the columns on their shared bucket index.
pub fn resample_table(table: &OhlcTable, target: Frequency) -> Result<ResampleOutcome, StoreError> {
    let (complete, dropped_incomplete) = table.complete_rows();

    let mut columns: Vec<FieldSeries> = Vec::with_capacity(PriceField::ALL.len());
    for field in PriceField::ALL {
        let column = FieldSeries {
            field,
            points: complete
                .rows()
                .iter()
                .filter_map(|row| {
                    row.get(field).map(|value| SeriesPoint {
                        timestamp: row.timestamp,
                        value,
                    })
                })
                .collect(),
        };
        columns.push(resample_field(&column, target, reducer_for(field)));
    }

    Ok(ResampleOutcome {
        table: zip_aligned(&columns)?,
        dropped_incomplete,
    })
}
