//! JSON form of a stored chunk.
//!
//! ```text
//! { "currency": "EURUSD", "type": "raw", "pricetype": "close", "freq": "min",
//!   "year": 2005, "month": 1,
//!   "begin": "2005-01-03T00:00:00Z", "end": "2005-01-31T23:59:00Z",
//!   "date": [ ... ], "close": [ ... ] }
//! ```
//!
//! `month` is written for raw chunks only. Older documents used `start` instead
//! of `begin`; both are accepted on read.

use chrono::{DateTime, SecondsFormat, Utc};
use fxvault_domain::errors::StoreError;
use fxvault_domain::value_objects::chunk::{ChunkKey, SeriesChunk};
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::price_field::PriceField;
use fxvault_domain::value_objects::series_kind::SeriesKind;
use serde_json::{Map, Value};

pub fn encode(chunk: &SeriesChunk) -> Value {
    let key = &chunk.key;
    let mut doc = Map::new();
    doc.insert("currency".into(), Value::from(key.instrument.clone()));
    doc.insert("type".into(), Value::from(key.kind.as_str()));
    doc.insert("pricetype".into(), Value::from(key.field.as_str()));
    doc.insert("freq".into(), Value::from(key.frequency.label()));
    doc.insert("year".into(), Value::from(key.year));
    if let Some(month) = key.month {
        doc.insert("month".into(), Value::from(month));
    }
    doc.insert("begin".into(), Value::from(format_ts(chunk.range_start)));
    doc.insert("end".into(), Value::from(format_ts(chunk.range_end)));
    doc.insert(
        "date".into(),
        Value::Array(
            chunk
                .timestamps
                .iter()
                .map(|ts| Value::from(format_ts(*ts)))
                .collect(),
        ),
    );
    doc.insert(
        key.field.as_str().into(),
        Value::Array(chunk.values.iter().map(|v| Value::from(*v)).collect()),
    );
    Value::Object(doc)
}

pub fn decode(doc: &Value) -> Result<SeriesChunk, StoreError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| corrupt("document is not an object"))?;

    let instrument = str_field(obj, "currency")?.to_string();
    let kind = SeriesKind::parse(str_field(obj, "type")?).map_err(corrupt)?;
    let field = PriceField::parse(str_field(obj, "pricetype")?).map_err(corrupt)?;
    let frequency = Frequency::parse(str_field(obj, "freq")?).map_err(corrupt)?;
    let year = obj
        .get("year")
        .and_then(Value::as_i64)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| corrupt("missing or invalid 'year'"))?;
    let month = match obj.get("month") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(|| corrupt("invalid 'month'"))?,
        ),
    };

    let begin_raw = obj
        .get("begin")
        .or_else(|| obj.get("start"))
        .and_then(Value::as_str)
        .ok_or_else(|| corrupt("missing 'begin'"))?;
    let range_start = parse_ts(begin_raw)?;
    let range_end = parse_ts(str_field(obj, "end")?)?;

    let timestamps = obj
        .get("date")
        .and_then(Value::as_array)
        .ok_or_else(|| corrupt("missing 'date' array"))?
        .iter()
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| corrupt("non-string entry in 'date'"))
                .and_then(parse_ts)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let values = obj
        .get(field.as_str())
        .and_then(Value::as_array)
        .ok_or_else(|| corrupt(format!("missing '{field}' array")))?
        .iter()
        .map(|value| {
            value
                .as_f64()
                .ok_or_else(|| corrupt(format!("non-numeric entry in '{field}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let key = ChunkKey {
        instrument,
        kind,
        field,
        frequency,
        year,
        month,
    };
    SeriesChunk::from_parts(key, range_start, range_end, timestamps, values)
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| corrupt(format!("invalid timestamp '{value}': {err}")))
}

fn str_field<'a>(obj: &'a Map<String, Value>, name: &str) -> Result<&'a str, StoreError> {
    obj.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| corrupt(format!("missing or non-string '{name}'")))
}

fn corrupt(msg: impl Into<String>) -> StoreError {
    StoreError::malformed(format!("corrupt chunk document: {}", msg.into()))
}
