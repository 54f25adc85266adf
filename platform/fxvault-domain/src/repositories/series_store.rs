use crate::errors::StoreError;
use crate::value_objects::chunk::{ChunkKey, SeriesChunk};
use crate::value_objects::frequency::Frequency;
use crate::value_objects::month_range::MonthRange;
use crate::value_objects::price_field::PriceField;
use crate::value_objects::series_kind::SeriesKind;

/// Selects every chunk of one series, optionally limited to a month range.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkQuery {
    pub instrument: String,
    pub kind: SeriesKind,
    pub field: PriceField,
    pub frequency: Frequency,
    /// Raw chunks match on (year, month); resampled chunks match on year.
    pub months: Option<MonthRange>,
}

impl ChunkQuery {
    pub fn matches(&self, key: &ChunkKey) -> bool {
        if key.instrument != self.instrument
            || key.kind != self.kind
            || key.field != self.field
            || key.frequency != self.frequency
        {
            return false;
        }
        match (&self.months, key.month) {
            (None, _) => true,
            (Some(range), Some(month)) => range.contains(key.year, month),
            (Some(range), None) => range.contains_year(key.year),
        }
    }
}

/// Chunked document storage.
///
/// Implementations own the documents: reads return independent copies and
/// `upsert_chunks` either writes the whole batch or nothing.
pub trait SeriesStore {
    /// Inserts or replaces each chunk by its key. Returns the number written.
    fn upsert_chunks(&self, chunks: &[SeriesChunk]) -> Result<usize, StoreError>;

    fn find_one(&self, key: &ChunkKey) -> Result<Option<SeriesChunk>, StoreError>;

    /// Matching chunks ordered by (year, month).
    fn find_chunks(&self, query: &ChunkQuery) -> Result<Vec<SeriesChunk>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::ChunkQuery;
    use crate::value_objects::chunk::ChunkKey;
    use crate::value_objects::frequency::Frequency;
    use crate::value_objects::month_range::MonthRange;
    use crate::value_objects::price_field::PriceField;
    use crate::value_objects::series_kind::SeriesKind;

    fn query(kind: SeriesKind, frequency: Frequency, months: Option<MonthRange>) -> ChunkQuery {
        ChunkQuery {
            instrument: "EURUSD".to_string(),
            kind,
            field: PriceField::Close,
            frequency,
            months,
        }
    }

    #[test]
    fn raw_query_matches_months_chronologically() {
        let q = query(
            SeriesKind::Raw,
            Frequency::MINUTE,
            Some(MonthRange::parse("2005-06", "2006-03").unwrap()),
        );
        let key = |y, m| ChunkKey::raw("EURUSD", PriceField::Close, Frequency::MINUTE, y, m);
        assert!(q.matches(&key(2005, 12)));
        assert!(q.matches(&key(2006, 1)));
        assert!(!q.matches(&key(2006, 4)));
        let other_pair = ChunkKey::raw("EURCHF", PriceField::Close, Frequency::MINUTE, 2005, 12);
        let other_field = ChunkKey::raw("EURUSD", PriceField::Open, Frequency::MINUTE, 2005, 12);
        assert!(!q.matches(&other_pair));
        assert!(!q.matches(&other_field));
    }

    #[test]
    fn resampled_query_matches_years_and_kind() {
        let q = query(
            SeriesKind::Resampled,
            Frequency::DAY,
            Some(MonthRange::parse("2005-06", "2006-03").unwrap()),
        );
        let daily = |year| ChunkKey::resampled("EURUSD", PriceField::Close, Frequency::DAY, year);
        assert!(q.matches(&daily(2006)));
        assert!(!q.matches(&daily(2007)));
        let hourly = ChunkKey::resampled("EURUSD", PriceField::Close, Frequency::HOUR, 2006);
        assert!(!q.matches(&hourly));
        assert!(!q.matches(&ChunkKey::raw("EURUSD", PriceField::Close, Frequency::DAY, 2006, 1)));
    }
}
