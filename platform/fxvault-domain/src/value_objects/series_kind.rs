use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Minute bars as ingested from the vendor feed, chunked per month.
    Raw,
    /// Aggregated bars, chunked per calendar year.
    Resampled,
}

impl SeriesKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesKind::Raw => "raw",
            SeriesKind::Resampled => "resampled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "raw" => Ok(SeriesKind::Raw),
            "resampled" => Ok(SeriesKind::Resampled),
            _ => Err(format!("unsupported series kind: {value}")),
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
