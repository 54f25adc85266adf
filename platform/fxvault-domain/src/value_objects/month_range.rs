use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("invalid month {month} (expected 1..=12)"));
        }
        Ok(Self { year, month })
    }

    /// Parses `YYYY-MM`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        let (year_part, month_part) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{value}'"))?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(format!("expected YYYY-MM, got '{value}'"));
        }
        let year: i32 = year_part
            .parse()
            .map_err(|_| format!("invalid year in '{value}'"))?;
        let month: u32 = month_part
            .parse()
            .map_err(|_| format!("invalid month in '{value}'"))?;
        Self::new(year, month)
    }

    /// Months since year 0, so consecutive months differ by one.
    pub fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive, chronological span of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub begin: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    pub fn new(begin: YearMonth, end: YearMonth) -> Result<Self, String> {
        if begin > end {
            return Err(format!("range begin {begin} is after end {end}"));
        }
        Ok(Self { begin, end })
    }

    pub fn parse(begin: &str, end: &str) -> Result<Self, String> {
        Self::new(YearMonth::parse(begin)?, YearMonth::parse(end)?)
    }

    pub fn contains(&self, year: i32, month: u32) -> bool {
        let ordinal = i64::from(year) * 12 + i64::from(month) - 1;
        (self.begin.ordinal()..=self.end.ordinal()).contains(&ordinal)
    }

    pub fn contains_year(&self, year: i32) -> bool {
        (self.begin.year..=self.end.year).contains(&year)
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.begin, self.end)
    }
}
