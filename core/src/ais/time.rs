//! Timestamp parsing contract.
//!
//! AIS exports from the Danish Maritime Authority write timestamps day-first
//! (`25/08/2024 00:00:00`). The format is an explicit configuration value so
//! that a month-first export is rejected instead of silently misread.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const DAY_FIRST_PATTERNS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

const YEAR_FIRST_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `dd/mm/yyyy HH:MM:SS`, also accepting unambiguous year-first input.
    #[default]
    DayFirst,
    /// ISO-8601 style `yyyy-mm-dd HH:MM:SS`.
    YearFirst,
}

impl TimestampFormat {
    pub fn parse(self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match self {
            TimestampFormat::DayFirst => parse_with(text, DAY_FIRST_PATTERNS)
                .or_else(|| parse_with(text, YEAR_FIRST_PATTERNS)),
            TimestampFormat::YearFirst => parse_with(text, YEAR_FIRST_PATTERNS),
        }
    }
}

fn parse_with(text: &str, patterns: &[&str]) -> Option<NaiveDateTime> {
    patterns
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
}
