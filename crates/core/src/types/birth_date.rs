//! Birth date type.
//!
//! Users enter birth dates as `YYYY-MM-DD`. The backend accepts that string
//! but returns dates in its serializer's native shape, a `[year, month, day]`
//! array, so deserialization accepts both and serialization always emits the
//! ISO string.

use core::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minimum age, in years, for creating an account.
pub const MINIMUM_AGE_YEARS: u32 = 13;

/// Errors that can occur when parsing or validating a [`BirthDate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BirthDateError {
    /// The input is not shaped like `YYYY-MM-DD`.
    #[error("invalid date format, use YYYY-MM-DD")]
    Format,
    /// The input is shaped correctly but names no calendar day.
    #[error("invalid date")]
    InvalidDate,
    /// The date lies after today.
    #[error("birth date cannot be in the future")]
    InFuture,
    /// The user is younger than [`MINIMUM_AGE_YEARS`].
    #[error("you must be at least {min} years old")]
    TooYoung {
        /// Required minimum age in years.
        min: u32,
    },
}

/// A calendar birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Parse a `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns [`BirthDateError::Format`] if the input is not four digits,
    /// a dash, two digits, a dash and two digits, and
    /// [`BirthDateError::InvalidDate`] if those digits name no real day.
    pub fn parse(s: &str) -> Result<Self, BirthDateError> {
        let shaped = s.len() == 10
            && s.char_indices().all(|(i, c)| match i {
                4 | 7 => c == '-',
                _ => c.is_ascii_digit(),
            });
        if !shaped {
            return Err(BirthDateError::Format);
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BirthDateError::InvalidDate)
    }

    /// Build a birth date from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`BirthDateError::InvalidDate`] if the parts name no real day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, BirthDateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(BirthDateError::InvalidDate)
    }

    /// Check the registration rules against `today`: not in the future and at
    /// least [`MINIMUM_AGE_YEARS`] old.
    ///
    /// # Errors
    ///
    /// Returns [`BirthDateError::InFuture`] or [`BirthDateError::TooYoung`].
    pub fn validate_for_registration(&self, today: NaiveDate) -> Result<(), BirthDateError> {
        if self.0 > today {
            return Err(BirthDateError::InFuture);
        }

        let youngest_allowed = today
            .checked_sub_months(Months::new(MINIMUM_AGE_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        if self.0 > youngest_allowed {
            return Err(BirthDateError::TooYoung {
                min: MINIMUM_AGE_YEARS,
            });
        }

        Ok(())
    }

    /// Get the underlying date.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for BirthDate {
    type Err = BirthDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BirthDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Shapes the backend uses for dates.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireDate {
    Iso(String),
    Parts(i32, u32, u32),
}

impl<'de> Deserialize<'de> for BirthDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireDate::deserialize(deserializer)? {
            WireDate::Iso(s) => {
                // Tolerate a trailing time component from datetime serializers.
                let date = s.split('T').next().unwrap_or_default();
                Self::parse(date).map_err(serde::de::Error::custom)
            }
            WireDate::Parts(year, month, day) => {
                Self::from_ymd(year, month, day).map_err(serde::de::Error::custom)
            }
        }
    }
}
