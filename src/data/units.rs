use crate::scaled_number::{ScaledNumber, ScaledNumberExt, SignificantDigits};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{
    fmt::{Display, Write},
    str::FromStr,
};

/// Measured current, in microamperes.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Current(pub f64);

impl Current {
    pub fn amperes(self) -> f64 {
        self.0 * 1e-6
    }
}

impl FromStr for Current {
    type Err = &'static str;

    /// Accepts either a bare number of microamperes (`"15"`) or a value with
    /// unit (`"15uA"`, `"1.5 mA"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_suffix('A') {
            Some(scaled) => {
                let amperes = f64::parse_scaled(scaled).ok_or("invalid current")?;
                Ok(Self(amperes * 1e6))
            }
            None => Ok(Self(s.parse().map_err(|_| "invalid current")?)),
        }
    }
}

impl Display for Current {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ScaledNumber::from(self.amperes()).fmt(f)?;
        f.write_char('A')
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, DeserializeFromStr, SerializeDisplay)]
pub struct Frequency(pub f64);

impl FromStr for Frequency {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_suffix("Hz").ok_or("not a frequency")?;
        Ok(Self(f64::parse_scaled(s).ok_or("invalid frequency")?))
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // no space between value and unit, so the output parses back
        let (val, scale) = self.0.unscale();
        SignificantDigits(val, 4).fmt(f)?;
        scale.fmt(f)?;
        f.write_str("Hz")
    }
}

/// Time between two consecutive samples, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SamplingPeriod(pub f64);

impl SamplingPeriod {
    pub fn from_frequency(frequency: Frequency) -> Self {
        Self(1e6 / frequency.0)
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl FromStr for SamplingPeriod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_suffix('s').ok_or("not a sampling period")?;
        let seconds = f64::parse_scaled(s).ok_or("invalid sampling period")?;
        Ok(Self(seconds * 1e6))
    }
}

impl Display for SamplingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ScaledNumber::from(self.0 * 1e-6).fmt(f)?;
        f.write_char('s')
    }
}

/// Point on the capture time axis, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// Two-line axis label: wall clock `HH:MM:SS` and the millisecond part
    /// with microsecond resolution, zero padded to `mmm.uuu`.
    pub fn clock_label(self) -> (String, String) {
        let micros = self.0.abs();
        let sign = if self.0 < 0.0 { "-" } else { "" };

        let total_seconds = (micros / 1e6).floor() as u64;
        let h = total_seconds / 3600 % 24;
        let m = total_seconds / 60 % 60;
        let s = total_seconds % 60;

        let subsecond = format!("{:.3}", (micros / 1e3) % 1e3);

        (
            format!("{sign}{h:02}:{m:02}:{s:02}"),
            format!("{subsecond:0>7}"),
        )
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0.0 { "-" } else { "" };
        write!(f, "{sign}{:.3} ms", self.0.abs() / 1e3)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}
