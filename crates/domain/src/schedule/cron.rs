//! Five-field cron expressions.
//!
//! `minute hour day-of-month month day-of-week`, where each field is `*`, a
//! literal, or a comma list of literals. Day-of-week (0-6, 0 = Sunday) also
//! accepts ranges (`1-5`) and English day abbreviations (`MON-FRI`).
//!
//! When both day-of-month and day-of-week are restricted, a time matches if
//! either one matches, like classic cron.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Reasons a cron expression is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronError {
    #[error("cron expression is empty")]
    Empty,

    #[error("expected 5 fields, found {0}")]
    WrongFieldCount(usize),

    #[error("invalid {field} value {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} value {value} outside {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("ranges are not supported in the {field} field")]
    RangeNotAllowed { field: &'static str },
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl FieldKind {
    const ALL: [Self; 5] = [
        Self::Minute,
        Self::Hour,
        Self::DayOfMonth,
        Self::Month,
        Self::DayOfWeek,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
        }
    }

    fn bounds(self) -> (u32, u32) {
        match self {
            Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 6),
        }
    }

    fn parse_value(self, raw: &str) -> Result<u32, CronError> {
        if let Self::DayOfWeek = self
            && let Some(idx) = DAY_NAMES
                .iter()
                .position(|name| name.eq_ignore_ascii_case(raw))
        {
            return u32::try_from(idx).map_err(|_| self.invalid(raw));
        }
        let value: u32 = raw.parse().map_err(|_| self.invalid(raw))?;
        let (min, max) = self.bounds();
        if value < min || value > max {
            return Err(CronError::OutOfRange {
                field: self.name(),
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    fn invalid(self, raw: &str) -> CronError {
        CronError::InvalidValue {
            field: self.name(),
            value: raw.to_string(),
        }
    }
}

/// Set of accepted values for one field, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Field {
    bits: u64,
    /// `false` for `*`.
    restricted: bool,
}

impl Field {
    fn parse(kind: FieldKind, raw: &str) -> Result<Self, CronError> {
        if raw == "*" {
            return Ok(Self {
                bits: u64::MAX,
                restricted: false,
            });
        }
        let mut bits = 0u64;
        for item in raw.split(',') {
            if item.is_empty() {
                return Err(kind.invalid(raw));
            }
            match item.split_once('-') {
                Some((start, end)) => {
                    if !matches!(kind, FieldKind::DayOfWeek) {
                        return Err(CronError::RangeNotAllowed { field: kind.name() });
                    }
                    let start = kind.parse_value(start)?;
                    let end = kind.parse_value(end)?;
                    if start > end {
                        return Err(kind.invalid(item));
                    }
                    for value in start..=end {
                        bits |= 1u64 << value;
                    }
                }
                None => bits |= 1u64 << kind.parse_value(item)?,
            }
        }
        Ok(Self {
            bits,
            restricted: true,
        })
    }

    fn contains(self, value: u32) -> bool {
        value < 64 && self.bits & (1u64 << value) != 0
    }
}

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronSchedule {
    expression: String,
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    /// Parse a five-field expression.
    ///
    /// # Errors
    ///
    /// Returns a [`CronError`] describing the first offending field.
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.is_empty() {
            return Err(CronError::Empty);
        }
        if parts.len() != FieldKind::ALL.len() {
            return Err(CronError::WrongFieldCount(parts.len()));
        }
        let mut fields = [Field {
            bits: 0,
            restricted: false,
        }; 5];
        for ((slot, kind), raw) in fields.iter_mut().zip(FieldKind::ALL).zip(&parts) {
            *slot = Field::parse(kind, raw)?;
        }
        let [minute, hour, day_of_month, month, day_of_week] = fields;
        Ok(Self {
            expression: parts.join(" "),
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        })
    }

    /// Whether the minute containing `at` satisfies this expression.
    ///
    /// Seconds are ignored. The caller decides the time zone.
    pub fn matches<T: Datelike + Timelike>(&self, at: &T) -> bool {
        if !self.minute.contains(at.minute())
            || !self.hour.contains(at.hour())
            || !self.month.contains(at.month())
        {
            return false;
        }
        let dom = self.day_of_month.contains(at.day());
        let dow = self
            .day_of_week
            .contains(at.weekday().num_days_from_sunday());
        if self.day_of_month.restricted && self.day_of_week.restricted {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// The normalised expression text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronSchedule {
    type Error = CronError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CronSchedule> for String {
    fn from(value: CronSchedule) -> Self {
        value.expression
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
