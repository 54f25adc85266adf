use chrono::SecondsFormat;
use fxvault_domain::value_objects::ohlc::OhlcTable;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct OhlcRecord {
    timestamp_utc: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
}

pub fn write_ohlc_csv(path: &Path, table: &OhlcTable) -> Result<usize, String> {
    let file = File::create(path)
        .map_err(|err| format!("failed to create {}: {}", path.display(), err))?;
    write_ohlc(file, table)
}

/// Missing prices are written as empty cells.
fn write_ohlc<W: Write>(out: W, table: &OhlcTable) -> Result<usize, String> {
    let mut writer = csv::Writer::from_writer(out);
    for row in table.rows() {
        writer
            .serialize(OhlcRecord {
                timestamp_utc: row.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            })
            .map_err(|err| format!("failed to write CSV row: {err}"))?;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to flush CSV: {err}"))?;
    Ok(table.len())
}
