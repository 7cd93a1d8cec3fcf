//! The three bar resolutions the pipeline works with.
//!
//! Display/parse use the compact CLI notation (`"1D"`, `"1h"`, `"5m"`); the
//! long names (`daily`, `hourly`, `5min`) are accepted on input too.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GranularityError {
    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

/// Row resolution of an OHLC table, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Hourly,
    FiveMinute,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Self::Daily, Self::Hourly, Self::FiveMinute];

    /// The `interval` query value for intraday endpoints; `None` for daily bars.
    pub const fn intraday_interval(self) -> Option<&'static str> {
        match self {
            Self::Daily => None,
            Self::Hourly => Some("60min"),
            Self::FiveMinute => Some("5min"),
        }
    }

    /// Directory name used when persisting tables of this granularity.
    pub const fn storage_dir(self) -> &'static str {
        match self {
            Self::Daily => "daily_data",
            Self::Hourly => "hourly_data",
            Self::FiveMinute => "five_minute_data",
        }
    }

    /// Prefix for a close column copied into a finer table (`"daily close"`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
            Self::FiveMinute => "five minute",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "1D",
            Self::Hourly => "1h",
            Self::FiveMinute => "5m",
        };
        f.write_str(s)
    }
}

impl FromStr for Granularity {
    type Err = GranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1D" | "D" | "daily" | "day" => Ok(Self::Daily),
            "1h" | "60m" | "60min" | "hourly" | "hour" => Ok(Self::Hourly),
            "5m" | "5min" | "five_minute" => Ok(Self::FiveMinute),
            other => Err(GranularityError::InvalidInput {
                message: format!("Invalid granularity: {other}"),
            }),
        }
    }
}
