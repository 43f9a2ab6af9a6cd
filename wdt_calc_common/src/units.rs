use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

#[cfg(feature = "defmt")]
use defmt::Format;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::Error;

const NS_PER_US: f64 = 1_000.0;
const US_PER_MS: f64 = 1_000.0;
const US_PER_S: f64 = 1_000_000.0;

/// Time unit a duration is entered in (and displayed back in).
///
/// Microseconds are the canonical unit: every interval and error the search
/// produces is expressed in microseconds.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    #[cfg_attr(feature = "serde", serde(rename = "ns"))]
    Nanoseconds,
    #[cfg_attr(feature = "serde", serde(rename = "us"))]
    Microseconds,
    #[cfg_attr(feature = "serde", serde(rename = "ms"))]
    Milliseconds,
    #[cfg_attr(feature = "serde", serde(rename = "s"))]
    Seconds,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
    ];

    pub const fn token(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "ns" => Ok(TimeUnit::Nanoseconds),
            "us" => Ok(TimeUnit::Microseconds),
            "ms" => Ok(TimeUnit::Milliseconds),
            "s" => Ok(TimeUnit::Seconds),
            _ => Err(Error::InvalidUnit(token.to_string())),
        }
    }
}

/// Convert `value` given in `unit` to microseconds.
pub fn to_canonical(value: f64, unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Nanoseconds => value / NS_PER_US,
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value * US_PER_MS,
        TimeUnit::Seconds => value * US_PER_S,
    }
}

/// Convert `value_us` (microseconds) to `unit`. Inverse of [`to_canonical`].
pub fn from_canonical(value_us: f64, unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Nanoseconds => value_us * NS_PER_US,
        TimeUnit::Microseconds => value_us,
        TimeUnit::Milliseconds => value_us / US_PER_MS,
        TimeUnit::Seconds => value_us / US_PER_S,
    }
}
