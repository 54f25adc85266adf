use crate::value_objects::ohlc::OhlcRow;

/// Counters describing how far a loaded feed is from a clean, evenly spaced series.
/// Timestamps are epoch seconds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DataQualityReport {
    pub duplicates: usize,
    pub gaps: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_gap: Option<i64>,
    pub first_duplicate: Option<i64>,
    pub first_out_of_order: Option<i64>,
    pub first_invalid_close: Option<i64>,
    pub max_gap_seconds: Option<i64>,
    pub gap_count: usize,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_close == 0
    }
}

/// Sorts rows, collapses duplicate timestamps (the later row wins) and counts
/// gaps larger than `expected_step_seconds`. Rows without a usable close are
/// dropped and counted as `invalid_close`.
pub fn canonicalize_rows(
    rows_raw: Vec<OhlcRow>,
    expected_step_seconds: Option<i64>,
    report: &mut DataQualityReport,
) -> Vec<OhlcRow> {
    let mut last_seen_ts: Option<i64> = None;
    let mut valid: Vec<OhlcRow> = Vec::with_capacity(rows_raw.len());
    for row in rows_raw {
        let ts = row.timestamp.timestamp();
        if !row.close.is_some_and(|close| close.is_finite() && close > 0.0) {
            report.invalid_close += 1;
            if report.first_invalid_close.is_none() {
                report.first_invalid_close = Some(ts);
            }
            continue;
        }
        if let Some(prev) = last_seen_ts {
            if ts < prev {
                report.out_of_order += 1;
                if report.first_out_of_order.is_none() {
                    report.first_out_of_order = Some(ts);
                }
            }
        }
        last_seen_ts = Some(ts);
        valid.push(row);
    }

    // Stable sort keeps file order among equal timestamps, so "last wins" holds.
    valid.sort_by_key(|row| row.timestamp);

    let mut rows: Vec<OhlcRow> = Vec::with_capacity(valid.len());
    for row in valid {
        if let Some(last) = rows.last_mut() {
            if row.timestamp == last.timestamp {
                report.duplicates += 1;
                if report.first_duplicate.is_none() {
                    report.first_duplicate = Some(row.timestamp.timestamp());
                }
                *last = row;
                continue;
            }
        }
        rows.push(row);
    }

    report.first_timestamp = rows.first().map(|r| r.timestamp.timestamp());
    report.last_timestamp = rows.last().map(|r| r.timestamp.timestamp());

    let step = expected_step_seconds.unwrap_or(1).max(1);
    let mut max_gap: Option<i64> = None;
    for pair in rows.windows(2) {
        let diff = pair[1].timestamp.timestamp() - pair[0].timestamp.timestamp();
        if diff > step {
            report.gaps += 1;
            report.gap_count += ((diff - 1) / step) as usize;
            if report.first_gap.is_none() {
                report.first_gap = Some(pair[1].timestamp.timestamp());
            }
            max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
        }
    }
    report.max_gap_seconds = max_gap;

    rows
}
