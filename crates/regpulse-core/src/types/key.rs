//! Grouping key fields and their values.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A record attribute usable as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    State,
    /// District name. Group by `[State, District]` to group by region.
    District,
    Date,
    Month,
    Weekday,
    Pincode,
}

impl KeyField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::District => "district",
            Self::Date => "date",
            Self::Month => "month",
            Self::Weekday => "weekday",
            Self::Pincode => "pincode",
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(Self::State),
            "district" => Ok(Self::District),
            "date" => Ok(Self::Date),
            "month" => Ok(Self::Month),
            "weekday" => Ok(Self::Weekday),
            "pincode" => Ok(Self::Pincode),
            other => Err(format!("unknown key field: {other}")),
        }
    }
}

/// The value of one key field for one record.
///
/// Values of the same field always share a variant (or are `Missing`),
/// so the derived ordering sorts keys naturally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Missing,
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl KeyValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("-"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}
