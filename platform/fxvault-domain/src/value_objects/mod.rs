pub mod chunk;
pub mod frequency;
pub mod month_range;
pub mod ohlc;
pub mod period;
pub mod price_field;
pub mod series;
pub mod series_kind;
