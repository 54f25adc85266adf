use crate::errors::StoreError;
use crate::value_objects::frequency::Frequency;
use crate::value_objects::price_field::PriceField;
use crate::value_objects::series::SeriesPoint;
use crate::value_objects::series_kind::SeriesKind;
use chrono::{DateTime, Utc};
use std::fmt;

/// Unique identity of a stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey {
    pub instrument: String,
    pub kind: SeriesKind,
    pub field: PriceField,
    pub frequency: Frequency,
    pub year: i32,
    /// Present for raw month chunks, absent for resampled year chunks.
    pub month: Option<u32>,
}

impl ChunkKey {
    pub fn raw(
        instrument: impl Into<String>,
        field: PriceField,
        frequency: Frequency,
        year: i32,
        month: u32,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            kind: SeriesKind::Raw,
            field,
            frequency,
            year,
            month: Some(month),
        }
    }

    pub fn resampled(
        instrument: impl Into<String>,
        field: PriceField,
        frequency: Frequency,
        year: i32,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            kind: SeriesKind::Resampled,
            field,
            frequency,
            year,
            month: None,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.instrument, self.kind, self.field, self.frequency, self.year
        )?;
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
        }
        Ok(())
    }
}

/// One stored document: a single field's values for one coarse period.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChunk {
    pub key: ChunkKey,
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl SeriesChunk {
    /// Builds a chunk and derives its range from the payload.
    pub fn new(
        key: ChunkKey,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self, StoreError> {
        let (range_start, range_end) = validate_payload(&key, &timestamps, &values)?;
        Ok(Self {
            key,
            range_start,
            range_end,
            timestamps,
            values,
        })
    }

    /// Rebuilds a chunk read back from storage, checking the stored range against
    /// the payload.
    pub fn from_parts(
        key: ChunkKey,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self, StoreError> {
        let (first, last) = validate_payload(&key, &timestamps, &values)?;
        if first != range_start || last != range_end {
            return Err(StoreError::malformed(format!(
                "chunk {key}: stored range {}..{} does not match payload {}..{}",
                range_start.to_rfc3339(),
                range_end.to_rfc3339(),
                first.to_rfc3339(),
                last.to_rfc3339()
            )));
        }
        Ok(Self {
            key,
            range_start,
            range_end,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .map(|(timestamp, value)| SeriesPoint {
                timestamp: *timestamp,
                value: *value,
            })
    }
}

fn validate_payload(
    key: &ChunkKey,
    timestamps: &[DateTime<Utc>],
    values: &[f64],
) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    if timestamps.len() != values.len() {
        return Err(StoreError::malformed(format!(
            "chunk {key}: {} timestamps but {} values",
            timestamps.len(),
            values.len()
        )));
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(StoreError::malformed(format!(
            "chunk {key}: non-finite value in payload"
        )));
    }
    if timestamps.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(StoreError::malformed(format!(
            "chunk {key}: timestamps are not strictly increasing"
        )));
    }
    match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(StoreError::malformed(format!("chunk {key}: empty payload"))),
    }
}
