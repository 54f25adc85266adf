use crate::value_objects::price_field::PriceField;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Reconstructed single-field series, ordered by timestamp without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub field: PriceField,
    pub points: Vec<SeriesPoint>,
}

impl FieldSeries {
    pub fn empty(field: PriceField) -> Self {
        Self {
            field,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}
