//! Fixed-point megabyte quantities.
//!
//! Stored sizes and quota figures are megabytes with exactly four decimal
//! places. [`SizeMb`] keeps them as an integer count of ten-thousandths of
//! a megabyte so quota arithmetic is exact and reproducible; floating point
//! only appears when a value is rendered into JSON.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Bytes in one megabyte (binary).
pub const BYTES_PER_MB: u64 = 1_048_576;

/// Ten-thousandths per megabyte.
const SCALE: i64 = 10_000;

/// A non-negative megabyte amount with four decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct SizeMb(i64);

impl SizeMb {
    /// Zero megabytes.
    pub const ZERO: Self = Self(0);

    /// Convert a byte count to megabytes, rounded to four decimal places.
    ///
    /// Midpoints round to the even neighbour.
    pub fn from_bytes(bytes: u64) -> Self {
        let scaled = u128::from(bytes) * SCALE as u128;
        let divisor = u128::from(BYTES_PER_MB);
        let quotient = scaled / divisor;
        let remainder = scaled % divisor;
        let half = divisor / 2;

        let rounded = if remainder > half || (remainder == half && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        };
        Self(i64::try_from(rounded).unwrap_or(i64::MAX))
    }

    /// A whole number of megabytes.
    pub fn from_whole_mb(mb: u32) -> Self {
        Self(i64::from(mb) * SCALE)
    }

    /// Build from a raw ten-thousandths count (negative values clamp to zero).
    pub fn from_scaled(units: i64) -> Self {
        Self(units.max(0))
    }

    /// The raw ten-thousandths count.
    pub fn scaled(self) -> i64 {
        self.0
    }

    /// Whether this amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self((self.0 - other.0).max(0))
    }

    /// Lossy conversion for presentation.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl Add for SizeMb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SizeMb {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for SizeMb {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a SizeMb> for SizeMb {
    fn sum<I: Iterator<Item = &'a SizeMb>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for SizeMb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / SCALE, self.0 % SCALE)
    }
}

/// Error returned when a megabyte literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid megabyte amount '{0}': expected up to four decimal places")]
pub struct ParseSizeError(String);

impl FromStr for SizeMb {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSizeError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() || frac.len() > 4 {
            return Err(err());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: i64 = whole.parse().map_err(|_| err())?;
        let frac_units: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<4}").parse().map_err(|_| err())?
        };

        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac_units))
            .map(Self)
            .ok_or_else(err)
    }
}

impl Serialize for SizeMb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for SizeMb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SizeVisitor;

        impl Visitor<'_> for SizeVisitor {
            type Value = SizeMb;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a megabyte amount")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SizeMb, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(SCALE))
                    .map(SizeMb)
                    .ok_or_else(|| E::custom("megabyte amount out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SizeMb, E> {
                if v < 0 {
                    return Err(E::custom("megabyte amount must not be negative"));
                }
                self.visit_u64(v as u64)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<SizeMb, E> {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("megabyte amount must be a non-negative number"));
                }
                Ok(SizeMb((v * SCALE as f64).round() as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SizeMb, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}
