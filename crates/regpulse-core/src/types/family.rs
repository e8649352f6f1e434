//! Record families and their fixed category schemas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three record sources produced by the registration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Biometric,
    Demographic,
    Enrollment,
}

impl Family {
    pub const ALL: [Family; 3] = [Self::Biometric, Self::Demographic, Self::Enrollment];

    /// Category count columns, in declaration order.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Self::Biometric => &["bio_age_5_17", "bio_age_17_"],
            Self::Demographic => &["demo_age_5_17", "demo_age_17_"],
            Self::Enrollment => &["age_0_5", "age_5_17", "age_18_greater"],
        }
    }

    /// Name of the derived per-row total column.
    pub fn total_name(&self) -> &'static str {
        match self {
            Self::Biometric => "total_bio",
            Self::Demographic => "total_demo",
            Self::Enrollment => "total_enroll",
        }
    }

    /// The category that counts adults (17+ for updates, 18+ for enrollment).
    pub fn adult_category(&self) -> &'static str {
        match self {
            Self::Biometric => "bio_age_17_",
            Self::Demographic => "demo_age_17_",
            Self::Enrollment => "age_18_greater",
        }
    }

    /// Position of `name` among the category columns.
    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.categories().iter().position(|c| *c == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Biometric => "biometric",
            Self::Demographic => "demographic",
            Self::Enrollment => "enrollment",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "biometric" | "bio" => Ok(Self::Biometric),
            "demographic" | "demo" => Ok(Self::Demographic),
            "enrollment" | "enrolment" | "enroll" => Ok(Self::Enrollment),
            other => Err(format!("unknown record family: {other}")),
        }
    }
}
