use rti_ports::{LogicalTime, LogicalTimeInterval, TimeError, TimeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 64-bit integer logical time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Integer64Time(i64);

/// 64-bit integer interval, never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Integer64Interval(i64);

impl Integer64Time {
    pub const INITIAL: Integer64Time = Integer64Time(0);
    pub const FINAL: Integer64Time = Integer64Time(i64::MAX);

    /// Create a time; negative values are outside the domain
    pub fn new(value: i64) -> TimeResult<Self> {
        if value < Self::INITIAL.0 {
            return Err(TimeError::InvalidTime(format!(
                "{} is less than the initial time {}",
                value,
                Self::INITIAL.0
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Integer64Interval {
    pub const ZERO: Integer64Interval = Integer64Interval(0);
    pub const EPSILON: Integer64Interval = Integer64Interval(1);

    pub fn new(value: i64) -> TimeResult<Self> {
        if value < 0 {
            return Err(TimeError::InvalidInterval(format!(
                "{} is negative",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Integer64Time {
    type Error = TimeError;

    fn try_from(value: i64) -> TimeResult<Self> {
        Self::new(value)
    }
}

impl From<Integer64Time> for i64 {
    fn from(time: Integer64Time) -> Self {
        time.0
    }
}

impl TryFrom<i64> for Integer64Interval {
    type Error = TimeError;

    fn try_from(value: i64) -> TimeResult<Self> {
        Self::new(value)
    }
}

impl From<Integer64Interval> for i64 {
    fn from(interval: Integer64Interval) -> Self {
        interval.0
    }
}

impl fmt::Display for Integer64Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Integer64Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl LogicalTimeInterval for Integer64Interval {
    fn zero() -> Self {
        Self::ZERO
    }

    fn epsilon() -> Self {
        Self::EPSILON
    }
}

impl LogicalTime for Integer64Time {
    type Interval = Integer64Interval;

    fn initial() -> Self {
        Self::INITIAL
    }

    fn final_time() -> Self {
        Self::FINAL
    }

    fn add(&self, interval: Integer64Interval) -> TimeResult<Self> {
        self.0.checked_add(interval.0).map(Self).ok_or_else(|| {
            TimeError::IllegalTimeArithmetic(format!(
                "{} + {} is greater than the final time {}",
                self.0,
                interval.0,
                Self::FINAL.0
            ))
        })
    }

    fn subtract(&self, interval: Integer64Interval) -> TimeResult<Self> {
        match self.0.checked_sub(interval.0) {
            Some(value) if value >= Self::INITIAL.0 => Ok(Self(value)),
            _ => Err(TimeError::IllegalTimeArithmetic(format!(
                "{} - {} is less than the initial time {}",
                self.0,
                interval.0,
                Self::INITIAL.0
            ))),
        }
    }

    fn representation() -> &'static str {
        "HLAinteger64Time"
    }
}
