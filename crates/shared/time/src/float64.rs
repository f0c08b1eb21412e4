use rti_ports::{LogicalTime, LogicalTimeInterval, TimeError, TimeResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 64-bit floating point logical time
///
/// Only finite, non-negative values are admitted, which makes the total
/// order below agree with the numeric one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Float64Time(f64);

/// 64-bit floating point interval, finite and never negative
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Float64Interval(f64);

fn check_value(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        // -0.0 would otherwise sort below 0.0 under total_cmp
        Some(value + 0.0)
    } else {
        None
    }
}

// Times are finite and non-negative, so stepping the bit pattern moves to
// the adjacent representable value; past f64::MAX it becomes infinite and
// below zero it becomes negative, both rejected by check_value.
fn next_up(value: f64) -> f64 {
    f64::from_bits(value.to_bits() + 1)
}

fn next_down(value: f64) -> f64 {
    if value == 0.0 {
        -f64::MIN_POSITIVE
    } else {
        f64::from_bits(value.to_bits() - 1)
    }
}

impl Float64Time {
    pub const INITIAL: Float64Time = Float64Time(0.0);
    pub const FINAL: Float64Time = Float64Time(f64::MAX);

    pub fn new(value: f64) -> TimeResult<Self> {
        check_value(value).map(Self).ok_or_else(|| {
            TimeError::InvalidTime(format!("{} is not a finite, non-negative time", value))
        })
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    fn checked(value: f64, op: &str, lhs: f64, rhs: f64) -> TimeResult<Self> {
        check_value(value).map(Self).ok_or_else(|| {
            TimeError::IllegalTimeArithmetic(format!(
                "{} {} {} is outside [{}, {}]",
                lhs,
                op,
                rhs,
                Self::INITIAL.0,
                Self::FINAL.0
            ))
        })
    }
}

impl Float64Interval {
    pub const ZERO: Float64Interval = Float64Interval(0.0);
    /// One step of the time grid: adding it moves a time to the next
    /// representable value, however large the time
    pub const EPSILON: Float64Interval = Float64Interval(f64::MIN_POSITIVE);

    pub fn new(value: f64) -> TimeResult<Self> {
        check_value(value).map(Self).ok_or_else(|| {
            TimeError::InvalidInterval(format!(
                "{} is not a finite, non-negative interval",
                value
            ))
        })
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for Float64Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Float64Time {}

impl PartialOrd for Float64Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float64Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Float64Time {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialEq for Float64Interval {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Float64Interval {}

impl PartialOrd for Float64Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float64Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Float64Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for Float64Time {
    type Error = TimeError;

    fn try_from(value: f64) -> TimeResult<Self> {
        Self::new(value)
    }
}

impl From<Float64Time> for f64 {
    fn from(time: Float64Time) -> Self {
        time.0
    }
}

impl TryFrom<f64> for Float64Interval {
    type Error = TimeError;

    fn try_from(value: f64) -> TimeResult<Self> {
        Self::new(value)
    }
}

impl From<Float64Interval> for f64 {
    fn from(interval: Float64Interval) -> Self {
        interval.0
    }
}

impl fmt::Display for Float64Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Float64Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl LogicalTimeInterval for Float64Interval {
    fn zero() -> Self {
        Self::ZERO
    }

    fn epsilon() -> Self {
        Self::EPSILON
    }
}

impl LogicalTime for Float64Time {
    type Interval = Float64Interval;

    fn initial() -> Self {
        Self::INITIAL
    }

    fn final_time() -> Self {
        Self::FINAL
    }

    /// Adding `EPSILON` steps to the next representable time; any other
    /// interval is ordinary float addition
    fn add(&self, interval: Float64Interval) -> TimeResult<Self> {
        let sum = if interval == Float64Interval::EPSILON {
            next_up(self.0)
        } else {
            self.0 + interval.0
        };
        Self::checked(sum, "+", self.0, interval.0)
    }

    fn subtract(&self, interval: Float64Interval) -> TimeResult<Self> {
        let difference = if interval == Float64Interval::EPSILON {
            next_down(self.0)
        } else {
            self.0 - interval.0
        };
        Self::checked(difference, "-", self.0, interval.0)
    }

    fn representation() -> &'static str {
        "HLAfloat64Time"
    }
}
