use crate::value_objects::frequency::Frequency;
use chrono::{DateTime, Utc};

/// Representative spacing of a series in seconds.
///
/// Prefers the most frequent positive delta between adjacent timestamps; when
/// several deltas tie for most frequent, returns the lower median so the result
/// is always an observed cadence. Input order and duplicates do not matter.
/// Returns `None` with fewer than two distinct timestamps.
pub fn estimate_step_seconds(timestamps: &[DateTime<Utc>]) -> Option<i64> {
    let mut sorted: Vec<DateTime<Utc>> = timestamps.to_vec();
    sorted.sort();
    sorted.dedup();
    if sorted.len() < 2 {
        return None;
    }

    let mut deltas: Vec<i64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds())
        .filter(|delta| *delta > 0)
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();

    let mut best_delta = deltas[0];
    let mut best_count = 0usize;
    let mut ties = 0usize;
    for run in deltas.chunk_by(|a, b| a == b) {
        if run.len() > best_count {
            best_count = run.len();
            best_delta = run[0];
            ties = 1;
        } else if run.len() == best_count {
            ties += 1;
        }
    }
    if ties == 1 {
        return Some(best_delta);
    }

    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 1 {
        Some(deltas[mid])
    } else {
        Some(deltas[mid - 1])
    }
}

pub fn infer_frequency(timestamps: &[DateTime<Utc>]) -> Option<Frequency> {
    estimate_step_seconds(timestamps).and_then(|step| Frequency::from_seconds(step).ok())
}
