//! RTI Runner - Scripted Federation Scenarios
//!
//! Drives one federation's time management from a JSON scenario:
//!
//! - **Scenario**: federates plus an ordered list of operations
//! - **Runner**: in-memory federation, one callback collector per federate
//! - **Report**: callbacks received and final time state of every federate
//!
//! ## Flow
//!
//! ```text
//!   scenario.json ──► ScenarioRunner ──► Federation ──► callback channels
//!                                                            │
//!                          ScenarioReport ◄── collectors ◄───┘
//! ```

pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export main types
pub use error::{Result, RunnerError};
pub use report::{FederateReport, ScenarioOutcome, ScenarioReport, StepOutcome};
pub use runner::ScenarioRunner;
pub use scenario::{Action, FederateConfig, ScenarioFile, ScenarioStep};
