// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

const MAX_SIGNIFICANT_DIGITS: usize = 18;
const MAX_SCALE: u32 = 18;

/// Exact base-10 number parsed from user or catalog input.
///
/// Quantities and prices never go through binary floating point, so
/// `quantity * price` rounds to cents exactly the way it reads on screen.
/// Values are kept normalized: no trailing fractional zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    units: i128,
    scale: u32,
}

impl Decimal {
    pub const ZERO: Self = Self { units: 0, scale: 0 };
    pub const ONE: Self = Self { units: 1, scale: 0 };

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (negative, body) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|byte| byte.is_ascii_digit())
            || !fraction.bytes().all(|byte| byte.is_ascii_digit())
        {
            return None;
        }

        let fraction = fraction.trim_end_matches('0');
        let scale = u32::try_from(fraction.len()).ok()?;
        if scale > MAX_SCALE {
            return None;
        }

        let digits = format!("{whole}{fraction}");
        let significant = digits.trim_start_matches('0');
        if significant.len() > MAX_SIGNIFICANT_DIGITS {
            return None;
        }
        let magnitude: i128 = if significant.is_empty() {
            0
        } else {
            significant.parse().ok()?
        };

        Some(
            Self {
                units: if negative { -magnitude } else { magnitude },
                scale,
            }
            .normalized(),
        )
    }

    /// Parses `raw`, treating anything non-numeric or negative as zero.
    pub fn parse_or_zero(raw: &str) -> Self {
        Self::parse(raw)
            .map(Self::clamp_non_negative)
            .unwrap_or(Self::ZERO)
    }

    pub const fn from_cents(cents: i64) -> Self {
        Self {
            units: cents as i128,
            scale: 2,
        }
        .normalized()
    }

    pub const fn is_zero(self) -> bool {
        self.units == 0
    }

    pub const fn is_negative(self) -> bool {
        self.units < 0
    }

    pub const fn clamp_non_negative(self) -> Self {
        if self.units < 0 { Self::ZERO } else { self }
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let units = self.units.checked_mul(other.units)?;
        let scale = self.scale + other.scale;
        Some(Self { units, scale }.normalized())
    }

    /// Rounds to two decimals, half away from zero.
    pub fn round_to_cents(self) -> Cents {
        let cents = if self.scale <= 2 {
            self.units
                .saturating_mul(10_i128.pow(2 - self.scale))
        } else {
            let divisor = 10_i128.pow(self.scale - 2);
            let magnitude = self.units.unsigned_abs() as i128;
            let mut quotient = magnitude / divisor;
            if (magnitude % divisor) * 2 >= divisor {
                quotient += 1;
            }
            if self.units < 0 { -quotient } else { quotient }
        };
        let clamped = cents.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        Cents::new(clamped as i64)
    }

    const fn normalized(mut self) -> Self {
        if self.units == 0 {
            return Self::ZERO;
        }
        while self.scale > 0 && self.units % 10 == 0 {
            self.units /= 10;
            self.scale -= 1;
        }
        self
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        if self.scale == 0 {
            return write!(f, "{sign}{digits}");
        }

        let scale = self.scale as usize;
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{whole}.{fraction}")
    }
}

/// A money amount in integer cents, always displayed with two decimals.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Reads a two-decimal display value back, e.g. `"12.30"`.
    pub fn parse(raw: &str) -> Option<Self> {
        Decimal::parse(raw).map(Decimal::round_to_cents)
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
