use crate::errors::StoreError;
use crate::value_objects::ohlc::OhlcTable;
use crate::value_objects::period::IngestPeriod;

/// Source of vendor minute bars, already converted to UTC.
pub trait QuoteArchive {
    /// `Ok(None)` when the archive holds nothing for this instrument and period.
    fn load(&self, instrument: &str, period: IngestPeriod) -> Result<Option<OhlcTable>, StoreError>;
}
