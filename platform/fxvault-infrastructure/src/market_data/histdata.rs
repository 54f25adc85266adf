use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::quote_archive::QuoteArchive;
use fxvault_domain::services::quality::{canonicalize_rows, DataQualityReport};
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::ohlc::{OhlcRow, OhlcTable};
use fxvault_domain::value_objects::period::IngestPeriod;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// HistData.com stamps bars in EST with no daylight saving.
const EST_OFFSET_SECS: i32 = 5 * 3600;

/// One `DAT_ASCII_*_M1_*.csv` line: `20050103 000000;1.3551;1.3552;1.3550;1.3551;0`.
#[derive(Debug, Deserialize)]
pub struct HistdataRecord {
    pub timestamp_est: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Directory of unzipped HistData ASCII M1 files.
#[derive(Debug, Clone)]
pub struct HistdataArchive {
    root: PathBuf,
}

impl HistdataArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn file_name(instrument: &str, period: IngestPeriod) -> String {
        match period {
            IngestPeriod::FullYear(year) => format!("DAT_ASCII_{instrument}_M1_{year}.csv"),
            IngestPeriod::Month { year, month } => {
                format!("DAT_ASCII_{instrument}_M1_{year}{month:02}.csv")
            }
        }
    }

    pub fn path_for(&self, instrument: &str, period: IngestPeriod) -> PathBuf {
        self.root.join(Self::file_name(instrument, period))
    }
}

impl QuoteArchive for HistdataArchive {
    fn load(
        &self,
        instrument: &str,
        period: IngestPeriod,
    ) -> Result<Option<OhlcTable>, StoreError> {
        let path = self.path_for(instrument, period);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no archive file");
                return Ok(None);
            }
            Err(err) => {
                return Err(StoreError::unavailable(format!(
                    "failed to open {}: {err}",
                    path.display()
                )))
            }
        };

        let (table, report) = parse_histdata(file)
            .map_err(|err| StoreError::malformed(format!("{}: {err}", path.display())))?;
        if report.is_clean() {
            tracing::info!(
                instrument,
                period = %period,
                rows = table.len(),
                gaps = report.gaps,
                "loaded archive file"
            );
        } else {
            tracing::warn!(
                instrument,
                period = %period,
                rows = table.len(),
                duplicates = report.duplicates,
                out_of_order = report.out_of_order,
                invalid_close = report.invalid_close,
                gaps = report.gaps,
                "archive file needed cleanup"
            );
        }
        Ok(Some(table))
    }
}

pub fn load_histdata_csv(path: &Path) -> Result<(OhlcTable, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open HistData CSV {}: {}", path.display(), err))?;
    parse_histdata(file)
}

pub fn parse_histdata<R: Read>(input: R) -> Result<(OhlcTable, DataQualityReport), String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut rows = Vec::new();
    for result in reader.deserialize::<HistdataRecord>() {
        let record = result.map_err(|err| format!("failed to parse HistData row: {}", err))?;
        let timestamp = parse_est_timestamp(&record.timestamp_est)?;
        rows.push(OhlcRow::complete(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    let mut report = DataQualityReport::default();
    let rows = canonicalize_rows(rows, Some(Frequency::MINUTE.step_seconds()), &mut report);
    let table = OhlcTable::new(rows).map_err(|err| err.to_string())?;
    Ok((table, report))
}

fn parse_est_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%d %H%M%S")
        .map_err(|err| format!("unsupported timestamp format '{value}': {err}"))?;
    let est = FixedOffset::west_opt(EST_OFFSET_SECS)
        .ok_or_else(|| "invalid EST offset".to_string())?;
    est.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("ambiguous timestamp '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::{load_histdata_csv, parse_histdata, HistdataArchive};
    use chrono::{TimeZone, Utc};
    use fxvault_domain::errors::StoreError;
    use fxvault_domain::repositories::quote_archive::QuoteArchive;
    use fxvault_domain::value_objects::period::IngestPeriod;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("fxvault_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn parse_shifts_est_to_utc() {
        let data = "20050102 190000;1.3551;1.3555;1.3549;1.3552;0\n\
20050102 190100;1.3552;1.3556;1.3550;1.3553;0\n";
        let (table, report) = parse_histdata(data.as_bytes()).expect("parse");
        assert!(report.is_clean());
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2005, 1, 3, 0, 0, 0).single().unwrap()
        );
        assert_eq!(first.open, Some(1.3551));
        assert_eq!(first.high, Some(1.3555));
        assert_eq!(first.low, Some(1.3549));
        assert_eq!(first.close, Some(1.3552));
        assert_eq!(first.volume, Some(0.0));
    }

    #[test]
    fn parse_collapses_duplicates_and_reports_them() {
        let data = "20050103 000100;2;2;2;2;0\n\
20050103 000000;1;1;1;1;0\n\
20050103 000100;3;3;3;3;0\n\
20050103 000500;4;4;4;4;0\n";
        let (table, report) = parse_histdata(data.as_bytes()).expect("parse");
        assert_eq!(table.len(), 3);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.out_of_order, 1);
        assert_eq!(report.gaps, 1);
        assert_eq!(report.gap_count, 3);
        assert_eq!(table.rows()[1].close, Some(3.0));
    }

    #[test]
    fn parse_rejects_bad_timestamp() {
        let err = parse_histdata("2005-01-03 00:00;1;1;1;1;0\n".as_bytes()).expect_err("bad ts");
        assert!(err.contains("unsupported timestamp format"));
    }

    #[test]
    fn file_names_follow_vendor_layout() {
        assert_eq!(
            HistdataArchive::file_name("EURUSD", IngestPeriod::FullYear(2005)),
            "DAT_ASCII_EURUSD_M1_2005.csv"
        );
        assert_eq!(
            HistdataArchive::file_name("EURUSD", IngestPeriod::month(2016, 2).unwrap()),
            "DAT_ASCII_EURUSD_M1_201602.csv"
        );
    }

    #[test]
    fn archive_load_reads_file_and_skips_missing() {
        let dir = unique_tmp_path("histdata_archive");
        fs::create_dir_all(&dir).expect("create dir");
        let archive = HistdataArchive::new(&dir);
        let path = archive.path_for("EURUSD", IngestPeriod::FullYear(2005));
        fs::write(&path, "20050103 000000;1;1;1;1;0\n").expect("write csv");

        let table = archive
            .load("EURUSD", IngestPeriod::FullYear(2005))
            .expect("load")
            .expect("file present");
        assert_eq!(table.len(), 1);
        assert!(archive
            .load("GBPUSD", IngestPeriod::FullYear(2005))
            .expect("load")
            .is_none());

        let (direct, _) = load_histdata_csv(&path).expect("direct load");
        assert_eq!(direct, table);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn archive_load_maps_parse_failures_to_malformed_input() {
        let dir = unique_tmp_path("histdata_bad");
        fs::create_dir_all(&dir).expect("create dir");
        let archive = HistdataArchive::new(&dir);
        fs::write(
            archive.path_for("EURUSD", IngestPeriod::FullYear(2005)),
            "not;a;row\n",
        )
        .expect("write csv");
        let err = archive
            .load("EURUSD", IngestPeriod::FullYear(2005))
            .expect_err("bad file");
        assert!(matches!(err, StoreError::MalformedInput(_)));
        let _ = fs::remove_dir_all(&dir);
    }
}
