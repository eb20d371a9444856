use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use crate::constants::REFERENCE_IMPEDANCE;

/// Units a [`Signal`] can be tagged with.
///
/// The `dB*` units are logarithmic, `W`, `V` and `A` are linear.
/// Voltage and current are referenced to power through a 50 ohm load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    #[default]
    Dbm,
    Dbw,
    Dbv,
    Dba,
    Watt,
    Volt,
    Amp,
}

impl Unit {
    /// Parse a unit tag such as `"dBm"` or `"W"`.
    ///
    /// Unrecognized tags fall back to dBm. A bare `"dB"` is read as dBV.
    pub fn from_tag(tag: &str) -> Unit {
        match tag {
            "dBm" => Unit::Dbm,
            "dBW" => Unit::Dbw,
            "dBV" | "dB" => Unit::Dbv,
            "dBA" => Unit::Dba,
            "W" => Unit::Watt,
            "V" => Unit::Volt,
            "A" => Unit::Amp,
            other => {
                tracing::warn!(tag = other, "unrecognized unit, falling back to dBm");
                Unit::Dbm
            }
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Unit::Dbm => "dBm",
            Unit::Dbw => "dBW",
            Unit::Dbv => "dBV",
            Unit::Dba => "dBA",
            Unit::Watt => "W",
            Unit::Volt => "V",
            Unit::Amp => "A",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// 10*log10 that maps non-positive power to -inf instead of NaN
fn power_to_db(watts: f64) -> f64 {
    if watts > 0.0 {
        10.0 * watts.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// A magnitude tagged with a physical unit.
///
/// Arithmetic against plain numbers works on the raw magnitude and keeps the
/// unit of the left operand; nothing is converted implicitly. Use the `as_*`
/// accessors to read the value in another unit.
///
/// ```
/// use rfbudget::{Signal, Unit};
///
/// let p = Signal::dbm(0.0);
/// assert!((p.as_w() - 1.0e-3).abs() < 1e-12);
/// assert_eq!((p + 3.0).unit, Unit::Dbm);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Signal {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Default for Signal {
    fn default() -> Self {
        Signal::dbm(0.0)
    }
}

impl From<f64> for Signal {
    fn from(magnitude: f64) -> Signal {
        Signal::dbm(magnitude)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

impl Signal {
    pub fn new(magnitude: f64, unit: Unit) -> Signal {
        Signal { magnitude, unit }
    }

    /// Build a signal from a textual unit tag, falling back to dBm.
    pub fn with_tag(magnitude: f64, tag: &str) -> Signal {
        Signal::new(magnitude, Unit::from_tag(tag))
    }

    pub fn dbm(magnitude: f64) -> Signal {
        Signal::new(magnitude, Unit::Dbm)
    }

    pub fn dbw(magnitude: f64) -> Signal {
        Signal::new(magnitude, Unit::Dbw)
    }

    pub fn watts(magnitude: f64) -> Signal {
        Signal::new(magnitude, Unit::Watt)
    }

    pub fn volts(magnitude: f64) -> Signal {
        Signal::new(magnitude, Unit::Volt)
    }

    pub fn amps(magnitude: f64) -> Signal {
        Signal::new(magnitude, Unit::Amp)
    }

    /// Raise the raw magnitude to `exponent`, keeping the unit tag.
    pub fn pow(self, exponent: f64) -> Signal {
        Signal::new(self.magnitude.powf(exponent), self.unit)
    }

    /// Express this signal in `unit`.
    pub fn to_unit(&self, unit: Unit) -> Signal {
        Signal::new(self.as_unit(unit), unit)
    }

    /// Magnitude of this signal expressed in `unit`.
    pub fn as_unit(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Dbm => self.as_dbm(),
            Unit::Dbw => self.as_dbw(),
            Unit::Dbv => self.as_dbv(),
            Unit::Dba => self.as_dba(),
            Unit::Watt => self.as_w(),
            Unit::Volt => self.as_v(),
            Unit::Amp => self.as_a(),
        }
    }

    pub fn as_dbw(&self) -> f64 {
        match self.unit {
            Unit::Dbm => self.magnitude - 30.0,
            Unit::Dbw => self.magnitude,
            Unit::Dbv | Unit::Dba => 0.5 * self.magnitude,
            Unit::Watt => power_to_db(self.magnitude),
            Unit::Volt => power_to_db(self.magnitude.powi(2) / REFERENCE_IMPEDANCE),
            Unit::Amp => power_to_db(self.magnitude.powi(2) * REFERENCE_IMPEDANCE),
        }
    }

    pub fn as_dbm(&self) -> f64 {
        self.as_dbw() + 30.0
    }

    pub fn as_dbv(&self) -> f64 {
        2.0 * self.as_dbw()
    }

    pub fn as_dba(&self) -> f64 {
        2.0 * self.as_dbw()
    }

    pub fn as_w(&self) -> f64 {
        10.0_f64.powf(self.as_dbw() / 10.0)
    }

    pub fn as_v(&self) -> f64 {
        (self.as_w() * REFERENCE_IMPEDANCE).sqrt()
    }

    pub fn as_a(&self) -> f64 {
        (self.as_w() / REFERENCE_IMPEDANCE).sqrt()
    }
}

impl Add<f64> for Signal {
    type Output = Signal;

    fn add(self, rhs: f64) -> Signal {
        Signal::new(self.magnitude + rhs, self.unit)
    }
}

impl Sub<f64> for Signal {
    type Output = Signal;

    fn sub(self, rhs: f64) -> Signal {
        Signal::new(self.magnitude - rhs, self.unit)
    }
}

impl Mul<f64> for Signal {
    type Output = Signal;

    fn mul(self, rhs: f64) -> Signal {
        Signal::new(self.magnitude * rhs, self.unit)
    }
}

impl Div<f64> for Signal {
    type Output = Signal;

    fn div(self, rhs: f64) -> Signal {
        Signal::new(self.magnitude / rhs, self.unit)
    }
}

// Signals only order against signals of the same unit.
impl PartialOrd for Signal {
    fn partial_cmp(&self, other: &Signal) -> Option<Ordering> {
        if self.unit != other.unit {
            return None;
        }
        self.magnitude.partial_cmp(&other.magnitude)
    }
}
