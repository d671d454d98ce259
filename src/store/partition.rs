//! Monthly partition names such as `6/25`.

use crate::model::parse_date;
use anyhow::{bail, Context};
use chrono::Datelike;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifies the sheet holding one month of transactions. The name is `{month}/{yy}` with no
/// leading zero on the month, e.g. `6/25` for June 2025. Two-digit years are read as 20xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionName {
    year: i32,
    month: u32,
}

impl PartitionName {
    pub fn new(year: i32, month: u32) -> anyhow::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Month must be between 1 and 12, got {month}");
        }
        if !(2000..=2099).contains(&year) {
            bail!("Year must be between 2000 and 2099, got {year}");
        }
        Ok(Self { year, month })
    }

    /// Derives the partition from a `YYYY-MM-DD` date. Any time-of-day suffix is ignored.
    pub fn from_date_str(date: &str) -> anyhow::Result<Self> {
        let date = parse_date(date)?;
        Self::new(date.year(), date.month())
            .with_context(|| format!("No partition can hold the date {date}"))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.month, self.year % 100)
    }
}

impl FromStr for PartitionName {
    type Err = anyhow::Error;

    /// Parses names like `6/25` or `12/25`. Anything else, including `06/25`, `6/2025` and
    /// `Dashboard`, is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((month, year)) = s.split_once('/') else {
            bail!("'{s}' is not a month/year sheet name");
        };
        let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if !digits(month) || !digits(year) || month.starts_with('0') || year.len() != 2 {
            bail!("'{s}' is not a month/year sheet name");
        }
        let month: u32 = month.parse().with_context(|| format!("Bad month in '{s}'"))?;
        let year: i32 = year.parse().with_context(|| format!("Bad year in '{s}'"))?;
        Self::new(2000 + year, month)
    }
}

impl Serialize for PartitionName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PartitionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PartitionName::from_str(&s).map_err(serde::de::Error::custom)
    }
}
