//! Runtime assault schedule descriptor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::SharedError;

/// How often the runtime scheduler fires
///
/// Parsed from `"OFF"` or a duration string such as `"500ms"`, `"30s"`, `"5m"` or `"1h"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduleSpec {
    Off,
    Every(Duration),
}

impl ScheduleSpec {
    /// Period between scheduled runs, `None` when the schedule is off
    pub fn period(&self) -> Option<Duration> {
        match self {
            ScheduleSpec::Off => None,
            ScheduleSpec::Every(period) => Some(*period),
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, ScheduleSpec::Off)
    }
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        ScheduleSpec::Off
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSpec::Off => write!(f, "OFF"),
            ScheduleSpec::Every(period) => write!(f, "{}ms", period.as_millis()),
        }
    }
}

impl std::str::FromStr for ScheduleSpec {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.eq_ignore_ascii_case("off") || input == "-" {
            return Ok(ScheduleSpec::Off);
        }

        let invalid = || SharedError::InvalidSchedule { input: s.to_string() };

        let split = input.find(|c: char| !c.is_ascii_digit()).unwrap_or(input.len());
        let (digits, unit) = input.split_at(split);
        let amount: u64 = digits.parse().map_err(|_| invalid())?;

        let seconds_per_unit = match unit.trim() {
            "ms" => None,
            "s" | "" => Some(1),
            "m" => Some(60),
            "h" => Some(3600),
            _ => return Err(invalid()),
        };
        let period = match seconds_per_unit {
            None => Duration::from_millis(amount),
            Some(factor) => Duration::from_secs(amount.checked_mul(factor).ok_or_else(invalid)?),
        };

        if period.is_zero() {
            return Err(invalid());
        }
        Ok(ScheduleSpec::Every(period))
    }
}

impl TryFrom<String> for ScheduleSpec {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduleSpec> for String {
    fn from(spec: ScheduleSpec) -> Self {
        spec.to_string()
    }
}
