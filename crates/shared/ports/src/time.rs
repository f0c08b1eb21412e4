use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::TimeResult;

/// Port for a logical time interval (lookahead, epsilon)
///
/// Intervals are never negative.
pub trait LogicalTimeInterval: Copy + Ord + Hash + Debug + Display + Send + Sync + 'static {
    /// The zero-length interval
    fn zero() -> Self;

    /// The smallest representable positive interval
    fn epsilon() -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Port for a logical time domain
///
/// Different implementations support the standard representations:
/// - 64-bit integer time
/// - 64-bit floating point time
///
/// Arithmetic is checked: a result outside `[initial, final]` is an
/// `IllegalTimeArithmetic` error rather than a wrapped or saturated value.
pub trait LogicalTime: Copy + Ord + Hash + Debug + Display + Send + Sync + 'static {
    type Interval: LogicalTimeInterval;

    /// Time every federate starts at when it joins
    fn initial() -> Self;

    /// Greatest representable time
    fn final_time() -> Self;

    fn add(&self, interval: Self::Interval) -> TimeResult<Self>;

    fn subtract(&self, interval: Self::Interval) -> TimeResult<Self>;

    /// Name of the representation, for logs and configuration
    fn representation() -> &'static str {
        "LogicalTime"
    }
}
