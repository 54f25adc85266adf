use std::fmt;

pub const SECS_PER_MINUTE: i64 = 60;
pub const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
pub const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;
pub const SECS_PER_WEEK: i64 = 7 * SECS_PER_DAY;

const LABEL_UNITS: [(i64, &str); 5] = [
    (SECS_PER_WEEK, "W"),
    (SECS_PER_DAY, "D"),
    (SECS_PER_HOUR, "h"),
    (SECS_PER_MINUTE, "min"),
    (1, "s"),
];

/// Fixed-width bar spacing. The label is what gets stored in the `freq` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency {
    step_seconds: i64,
}

impl Frequency {
    /// Spacing of the raw vendor feed.
    pub const MINUTE: Frequency = Frequency {
        step_seconds: SECS_PER_MINUTE,
    };
    pub const HOUR: Frequency = Frequency {
        step_seconds: SECS_PER_HOUR,
    };
    pub const DAY: Frequency = Frequency {
        step_seconds: SECS_PER_DAY,
    };
    pub const WEEK: Frequency = Frequency {
        step_seconds: SECS_PER_WEEK,
    };

    pub fn from_seconds(step_seconds: i64) -> Result<Self, String> {
        if step_seconds <= 0 {
            return Err(format!("invalid frequency seconds: {step_seconds}"));
        }
        Ok(Self { step_seconds })
    }

    pub fn step_seconds(self) -> i64 {
        self.step_seconds
    }

    /// Weekly multiples bucket on Monday boundaries instead of the epoch.
    pub fn is_weekly(self) -> bool {
        self.step_seconds % SECS_PER_WEEK == 0
    }

    pub fn is_coarser_multiple_of(self, source: Frequency) -> bool {
        self.step_seconds > source.step_seconds && self.step_seconds % source.step_seconds == 0
    }

    pub fn label(self) -> String {
        for (unit, suffix) in LABEL_UNITS {
            if self.step_seconds % unit == 0 {
                let count = self.step_seconds / unit;
                return if count == 1 {
                    suffix.to_string()
                } else {
                    format!("{count}{suffix}")
                };
            }
        }
        format!("{}s", self.step_seconds)
    }

    /// Accepts stored labels (`min`, `5min`, `h`, `D`, `W`), short aliases
    /// (`1m`, `4h`, `1d`, `1w`), long aliases (`1hour`, `1day`, `1week`),
    /// the legacy `minute` tag and a bare number of seconds.
    pub fn parse(value: &str) -> Result<Self, String> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("empty frequency".to_string());
        }
        if normalized == "minute" {
            return Ok(Self::MINUTE);
        }
        if let Ok(seconds) = normalized.parse::<i64>() {
            return Self::from_seconds(seconds);
        }

        let split = normalized
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(normalized.len());
        let (number_part, unit) = normalized.split_at(split);
        let count: i64 = if number_part.is_empty() {
            1
        } else {
            number_part
                .parse()
                .map_err(|_| format!("invalid frequency: {value}"))?
        };

        let multiplier = match unit {
            "s" | "sec" => 1,
            "m" | "t" | "min" => SECS_PER_MINUTE,
            "h" | "hour" => SECS_PER_HOUR,
            "d" | "day" => SECS_PER_DAY,
            "w" | "week" => SECS_PER_WEEK,
            "mo" | "month" => {
                return Err(format!(
                    "calendar-month frequency is not fixed-width: {value}"
                ))
            }
            _ => return Err(format!("unsupported frequency unit: {value}")),
        };

        let seconds = count
            .checked_mul(multiplier)
            .ok_or_else(|| format!("frequency out of range: {value}"))?;
        Self::from_seconds(seconds)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
