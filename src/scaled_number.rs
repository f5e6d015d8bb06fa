use derive_more::From;
use std::fmt::{Display, Write};
use strum::FromRepr;

/// Number printed with a fixed count of significant digits, trailing zeros dropped.
#[derive(Debug, Clone, Copy, From)]
pub struct SignificantDigits(pub f64, pub usize);

impl Display for SignificantDigits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = round_significant(self.0, self.1);

        let magnitude = if rounded == 0.0 || !rounded.is_finite() {
            0
        } else {
            rounded.abs().log10().floor() as i32
        };
        let prec = (self.1 as i32 - 1 - magnitude).max(0) as usize;

        let s = if f.sign_plus() {
            format!("{rounded:+.prec$}")
        } else {
            format!("{rounded:.prec$}")
        };

        if s.contains('.') {
            f.write_str(s.trim_end_matches('0').trim_end_matches('.'))
        } else {
            f.write_str(&s)
        }
    }
}

/// Rounds `value` to `digits` significant digits.
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let exp = digits as i32 - 1 - magnitude;

    // dividing by an exact power of ten keeps integers like 120 exact
    if exp >= 0 {
        let factor = 10.0f64.powi(exp);
        (value * factor).round() / factor
    } else {
        let factor = 10.0f64.powi(-exp);
        (value / factor).round() * factor
    }
}

#[derive(Debug, Clone, Copy, From, PartialEq)]
pub struct ScaledNumber(pub f64);

impl Display for ScaledNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = f.precision().unwrap_or(4);
        let (unscaled, scale) = round_significant(self.0, digits).unscale();

        SignificantDigits::from((unscaled, digits)).fmt(f)?;
        f.write_char(' ')?;

        // respects alternate formatting
        scale.fmt(f)
    }
}

pub trait ScaledNumberExt: Sized {
    fn unscale(self) -> (f64, SiScale);
    fn parse_scaled(s: &str) -> Option<Self>;
}

impl ScaledNumberExt for f64 {
    fn unscale(self) -> (f64, SiScale) {
        if self == 0.0 || !self.is_finite() {
            return (self, SiScale::None);
        }

        let exp = ((self.abs().log10() / 3.0).floor() * 3.0) as i32;
        let exp = exp.clamp(SiScale::Pico as i32, SiScale::Giga as i32);
        let scale = SiScale::from_repr(exp as i8).unwrap_or_default();

        (self * 10.0f64.powi(-(scale as i8 as i32)), scale)
    }

    fn parse_scaled(s: &str) -> Option<Self> {
        let s = s.trim();
        let last = s.chars().next_back()?;

        if last.is_ascii_digit() || last == '.' {
            return s.parse::<f64>().ok();
        }

        let scale = SiScale::try_from(last).ok()?;
        let val = s[..s.len() - last.len_utf8()].trim_end().parse::<f64>().ok()?;

        Some(scale.apply_to(val))
    }
}

#[derive(Debug, Default, FromRepr, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i8)]
pub enum SiScale {
    Pico = -12,
    Nano = -9,
    Micro = -6,
    Milli = -3,
    #[default]
    None = 0,
    Kilo = 3,
    Mega = 6,
    Giga = 9,
}

impl SiScale {
    pub fn apply_to(self, unscaled: f64) -> f64 {
        unscaled * 10.0f64.powi(self as i8 as i32)
    }
}

impl TryFrom<char> for SiScale {
    type Error = ();
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'p' => Ok(SiScale::Pico),
            'n' => Ok(SiScale::Nano),
            'u' | 'µ' | 'μ' => Ok(SiScale::Micro),
            'm' => Ok(SiScale::Milli),
            'k' | 'K' => Ok(SiScale::Kilo),
            'M' => Ok(SiScale::Mega),
            'G' => Ok(SiScale::Giga),
            _ => Err(()),
        }
    }
}

impl Display for SiScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            SiScale::Pico => 'p',
            SiScale::Nano => 'n',
            SiScale::Micro => {
                if f.alternate() {
                    'u'
                } else {
                    'µ'
                }
            }
            SiScale::Milli => 'm',
            SiScale::None => return Ok(()),
            SiScale::Kilo => 'k',
            SiScale::Mega => 'M',
            SiScale::Giga => 'G',
        };

        f.write_char(c)
    }
}
