//! Hour-of-day policy windows.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WindowParseError;

const HOURS_PER_DAY: u32 = 24;
const ALL_HOURS: u32 = (1 << HOURS_PER_DAY) - 1;

/// A set of hours (0–23) during which a policy is active.
///
/// Built from a textual `HH-HH` interval. Equal endpoints mean "always";
/// otherwise the interval walks forward from start, wrapping past midnight,
/// and excludes the end hour. An empty string yields an empty (disabled) set.
///
/// Equality and hashing compare the covered hours only, so `"0-0"` equals
/// `"9-9"`. [`Display`](fmt::Display) still writes the interval as given.
///
/// # Examples
///
/// ```
/// use battery_sim::sim::window::TimeWindowSet;
///
/// let night: TimeWindowSet = "22-2".parse().unwrap();
/// assert_eq!(night.hours().collect::<Vec<_>>(), vec![0, 1, 22, 23]);
/// assert!(night.contains(23));
/// assert!(!night.contains(2));
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindowSet {
    mask: u32,
    bounds: Option<(u32, u32)>,
}

impl TimeWindowSet {
    /// The disabled window: matches no hour.
    pub const EMPTY: Self = Self {
        mask: 0,
        bounds: None,
    };

    /// Builds the window from its endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`WindowParseError::OutOfRange`] if either endpoint is ≥ 24.
    pub fn from_hours(start: u32, end: u32) -> Result<Self, WindowParseError> {
        for hour in [start, end] {
            if hour >= HOURS_PER_DAY {
                return Err(WindowParseError::OutOfRange(hour));
            }
        }

        let mask = if start == end {
            ALL_HOURS
        } else {
            let mut mask = 0;
            let mut hour = start;
            while hour != end {
                mask |= 1 << hour;
                hour = (hour + 1) % HOURS_PER_DAY;
            }
            mask
        };

        Ok(Self {
            mask,
            bounds: Some((start, end)),
        })
    }

    /// Parses an optional interval; `None` and blank strings disable the window.
    ///
    /// # Errors
    ///
    /// Propagates [`WindowParseError`] for malformed intervals.
    pub fn parse_optional(interval: Option<&str>) -> Result<Self, WindowParseError> {
        interval.map_or(Ok(Self::EMPTY), str::parse)
    }

    /// Returns `true` when the policy is active at `hour`.
    pub fn contains(&self, hour: u8) -> bool {
        u32::from(hour) < HOURS_PER_DAY && self.mask & (1 << hour) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Active hours in ascending order.
    pub fn hours(&self) -> impl Iterator<Item = u8> + '_ {
        (0..HOURS_PER_DAY as u8).filter(|&hour| self.contains(hour))
    }
}

impl PartialEq for TimeWindowSet {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
    }
}

impl Eq for TimeWindowSet {}

impl Hash for TimeWindowSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mask.hash(state);
    }
}

impl FromStr for TimeWindowSet {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::EMPTY);
        }

        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| WindowParseError::MissingSeparator(s.to_string()))?;
        Self::from_hours(parse_hour(start)?, parse_hour(end)?)
    }
}

fn parse_hour(raw: &str) -> Result<u32, WindowParseError> {
    let raw = raw.trim();
    raw.parse::<u32>()
        .map_err(|_| WindowParseError::NotAnInteger(raw.to_string()))
}

impl TryFrom<String> for TimeWindowSet {
    type Error = WindowParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeWindowSet> for String {
    fn from(window: TimeWindowSet) -> Self {
        window.to_string()
    }
}

impl fmt::Display for TimeWindowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((start, end)) => write!(f, "{start:02}-{end:02}"),
            None => Ok(()),
        }
    }
}
