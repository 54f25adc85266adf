use crate::errors::StoreError;
use crate::value_objects::price_field::PriceField;
use chrono::{DateTime, Utc};

/// One bar. Price columns are optional so that gaps produced by joins or by the
/// vendor feed stay visible until they are explicitly dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcRow {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl OhlcRow {
    pub fn complete(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    pub fn get(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    pub fn set(&mut self, field: PriceField, value: Option<f64>) {
        match field {
            PriceField::Open => self.open = value,
            PriceField::High => self.high = value,
            PriceField::Low => self.low = value,
            PriceField::Close => self.close = value,
        }
    }

    /// All four prices present and finite. Volume is not required.
    pub fn is_complete(&self) -> bool {
        PriceField::ALL
            .iter()
            .all(|field| self.get(*field).is_some_and(f64::is_finite))
    }
}

/// Bars indexed by strictly increasing UTC timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OhlcTable {
    rows: Vec<OhlcRow>,
}

impl OhlcTable {
    pub fn new(rows: Vec<OhlcRow>) -> Result<Self, StoreError> {
        if let Some(pair) = rows
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            let kind = if pair[1].timestamp == pair[0].timestamp {
                "duplicate"
            } else {
                "out-of-order"
            };
            return Err(StoreError::malformed(format!(
                "{kind} timestamp {} after {}",
                pair[1].timestamp.to_rfc3339(),
                pair[0].timestamp.to_rfc3339()
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[OhlcRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OhlcRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|row| row.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(|row| row.timestamp)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.rows.iter().map(|row| row.timestamp).collect()
    }

    /// Splits off rows with any missing price; returns the kept table and the
    /// number of dropped rows.
    pub fn complete_rows(&self) -> (OhlcTable, usize) {
        let rows: Vec<OhlcRow> = self
            .rows
            .iter()
            .filter(|row| row.is_complete())
            .cloned()
            .collect();
        let dropped = self.rows.len() - rows.len();
        (OhlcTable { rows }, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::{OhlcRow, OhlcTable};
    use crate::errors::StoreError;
    use chrono::{DateTime, Utc};

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).expect("valid timestamp")
    }

    #[test]
    fn new_rejects_duplicate_and_out_of_order_rows() {
        let dup = OhlcTable::new(vec![
            OhlcRow::complete(ts(0), 1.0, 1.0, 1.0, 1.0, 0.0),
            OhlcRow::complete(ts(0), 1.0, 1.0, 1.0, 1.0, 0.0),
        ])
        .expect_err("duplicate");
        assert!(matches!(dup, StoreError::MalformedInput(ref msg) if msg.contains("duplicate")));

        let ooo = OhlcTable::new(vec![
            OhlcRow::complete(ts(60), 1.0, 1.0, 1.0, 1.0, 0.0),
            OhlcRow::complete(ts(0), 1.0, 1.0, 1.0, 1.0, 0.0),
        ])
        .expect_err("out of order");
        assert!(matches!(ooo, StoreError::MalformedInput(ref msg) if msg.contains("out-of-order")));
    }

    #[test]
    fn complete_rows_drops_missing_and_non_finite_prices() {
        let mut missing = OhlcRow::complete(ts(60), 1.0, 1.0, 1.0, 1.0, 0.0);
        missing.low = None;
        let nan = OhlcRow::complete(ts(120), 1.0, f64::NAN, 1.0, 1.0, 0.0);
        let mut no_volume = OhlcRow::complete(ts(180), 1.0, 1.0, 1.0, 1.0, 0.0);
        no_volume.volume = None;

        let table = OhlcTable::new(vec![
            OhlcRow::complete(ts(0), 1.0, 1.0, 1.0, 1.0, 0.0),
            missing,
            nan,
            no_volume,
        ])
        .unwrap();

        let (complete, dropped) = table.complete_rows();
        assert_eq!(dropped, 2);
        assert_eq!(complete.timestamps(), vec![ts(0), ts(180)]);
    }
}
