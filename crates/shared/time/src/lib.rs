//! RTI Logical Time
//!
//! The two standard logical time representations:
//!
//! ```text
//! Integer64Time   i64 ticks, epsilon = 1
//! Float64Time     f64,       epsilon = f64::MIN_POSITIVE
//! ```
//!
//! Both start at zero and end at the type's maximum value. Arithmetic that
//! leaves that range is reported as `TimeError::IllegalTimeArithmetic`.
//!
//! ## Usage
//!
//! ```ignore
//! use rti_time::{Integer64Interval, Integer64Time};
//! use rti_ports::LogicalTime;
//!
//! let lookahead = Integer64Interval::new(10)?;
//! let lots = Integer64Time::new(20).add(lookahead)?; // 30
//! ```

mod float64;
mod integer64;

pub use float64::{Float64Interval, Float64Time};
pub use integer64::{Integer64Interval, Integer64Time};

// Re-export the ports for convenience
pub use rti_ports::{LogicalTime, LogicalTimeInterval, TimeError, TimeResult};
