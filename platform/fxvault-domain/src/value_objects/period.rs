use std::fmt;

/// Coverage of one vendor archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPeriod {
    FullYear(i32),
    Month { year: i32, month: u32 },
}

impl IngestPeriod {
    pub fn year(self) -> i32 {
        match self {
            IngestPeriod::FullYear(year) | IngestPeriod::Month { year, .. } => year,
        }
    }

    pub fn month(year: i32, month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("invalid month {month} (expected 1..=12)"));
        }
        Ok(IngestPeriod::Month { year, month })
    }
}

impl fmt::Display for IngestPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestPeriod::FullYear(year) => write!(f, "{year}"),
            IngestPeriod::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}
